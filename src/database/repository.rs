//! Storage traits for the marketplace.
//!
//! Each aggregate gets its own repository trait; [`Store`] bundles them so
//! handlers and services can hold a single `Arc<dyn Store>`. Two backends
//! implement every trait:
//! - [`PgStore`](super::postgres::PgStore) for production
//! - [`MemoryStore`](super::memory::MemoryStore) for local runs without a
//!   database and for HTTP-level tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::session::SessionRecord;
use crate::database::schema::types::UserRole;
use crate::error::ApiError;
use crate::models::{
    Availability, Booking, BookingChanges, Message, NewAvailability, NewBooking, NewMessage,
    NewProviderProfile, NewReview, NewServiceListing, NewUser, ProviderFilter, ProviderProfile,
    ProviderWithDetails, Review, ServiceFilter, ServiceListing, UpdateProviderRequest,
    UpdateServiceRequest, UpdateUserRequest, User, VerificationRequest,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn update_user(
        &self,
        id: Uuid,
        changes: &UpdateUserRequest,
    ) -> Result<Option<User>, ApiError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or refresh a session row.
    async fn save_session(&self, record: &SessionRecord) -> Result<(), ApiError>;

    async fn load_session(&self, sid: &str) -> Result<Option<SessionRecord>, ApiError>;

    async fn delete_session(&self, sid: &str) -> Result<(), ApiError>;

    /// Remove every session that expired before `now`; returns how many.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, ApiError>;
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Creates the profile and promotes the owner to `provider` atomically.
    /// Fails with `AlreadyExists` when the user already has a profile.
    async fn create_provider(&self, new: NewProviderProfile) -> Result<ProviderProfile, ApiError>;

    async fn find_provider(&self, id: Uuid) -> Result<Option<ProviderProfile>, ApiError>;

    async fn find_provider_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProviderProfile>, ApiError>;

    /// Profiles matching `filter`, each joined with its user and listings.
    async fn list_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderWithDetails>, ApiError>;

    async fn provider_details(&self, id: Uuid) -> Result<Option<ProviderWithDetails>, ApiError>;

    async fn update_provider(
        &self,
        id: Uuid,
        changes: &UpdateProviderRequest,
    ) -> Result<Option<ProviderProfile>, ApiError>;

    async fn set_verification(
        &self,
        id: Uuid,
        request: &VerificationRequest,
    ) -> Result<Option<ProviderProfile>, ApiError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create_service(&self, new: NewServiceListing) -> Result<ServiceListing, ApiError>;

    async fn find_service(&self, id: Uuid) -> Result<Option<ServiceListing>, ApiError>;

    /// Active listings matching `filter`, oldest first.
    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>, ApiError>;

    /// Every listing of one provider, including inactive ones.
    async fn services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceListing>, ApiError>;

    async fn update_service(
        &self,
        id: Uuid,
        changes: &UpdateServiceRequest,
    ) -> Result<Option<ServiceListing>, ApiError>;

    /// Fails with `Conflict` while bookings still reference the listing.
    async fn delete_service(&self, id: Uuid) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts with status `pending`. Fails with `SlotUnavailable` when a live
    /// scheduled booking already holds the same provider slot.
    async fn create_booking(&self, new: NewBooking) -> Result<Booking, ApiError>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError>;

    /// In creation order.
    async fn bookings_for_client(&self, client_id: Uuid) -> Result<Vec<Booking>, ApiError>;

    /// In creation order.
    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>, ApiError>;

    /// Applies `changes` only while the stored status still equals
    /// `changes.expected_status`; returns `None` otherwise. When the status
    /// changes, the provider's job aggregates are recomputed in the same
    /// transaction.
    async fn update_booking(
        &self,
        id: Uuid,
        changes: &BookingChanges,
    ) -> Result<Option<Booking>, ApiError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review and recomputes the provider's rating and review
    /// count atomically. Fails with `AlreadyExists` for a second review of
    /// the same booking.
    async fn create_review(&self, new: NewReview) -> Result<Review, ApiError>;

    /// Newest first.
    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>, ApiError>;

    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>, ApiError>;

    async fn reviewed_booking_ids(&self, client_id: Uuid) -> Result<Vec<Uuid>, ApiError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create_message(&self, new: NewMessage) -> Result<Message, ApiError>;

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, ApiError>;

    /// Chronological.
    async fn messages_for_booking(&self, booking_id: Uuid) -> Result<Vec<Message>, ApiError>;

    async fn mark_message_read(&self, id: Uuid) -> Result<Option<Message>, ApiError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn create_availability(&self, new: NewAvailability) -> Result<Availability, ApiError>;

    async fn find_availability(&self, id: Uuid) -> Result<Option<Availability>, ApiError>;

    /// Ordered by day, then start time.
    async fn availability_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Availability>, ApiError>;

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip to the backend.
    async fn ping(&self) -> Result<(), ApiError>;

    fn backend(&self) -> &'static str;
}

/// Everything the application needs from persistence.
pub trait Store:
    UserRepository
    + SessionRepository
    + ProviderRepository
    + ServiceRepository
    + BookingRepository
    + ReviewRepository
    + MessageRepository
    + AvailabilityRepository
    + StoreHealth
{
}

impl<T> Store for T where
    T: UserRepository
        + SessionRepository
        + ProviderRepository
        + ServiceRepository
        + BookingRepository
        + ReviewRepository
        + MessageRepository
        + AvailabilityRepository
        + StoreHealth
{
}

/// Transaction wrapper for database operations
pub struct Transaction<'a> {
    tx: sqlx::Transaction<'a, sqlx::Postgres>,
}

impl<'a> Transaction<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, ApiError> {
        let tx = pool.begin().await.map_err(ApiError::from)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<(), ApiError> {
        self.tx.commit().await.map_err(ApiError::from)
    }

    pub fn inner(&mut self) -> &mut sqlx::Transaction<'a, sqlx::Postgres> {
        &mut self.tx
    }
}

/// Role granted to a user who opens a provider profile; admins keep theirs.
pub fn role_after_provider_signup(current: UserRole) -> UserRole {
    match current {
        UserRole::Admin => UserRole::Admin,
        _ => UserRole::Provider,
    }
}
