//! In-process [`Store`](super::repository::Store) used when no `DATABASE_URL`
//! is configured and by the HTTP-level tests.
//!
//! All tables live behind one `RwLock`, so every write (including the
//! aggregate recomputations) is atomic with respect to readers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{
    role_after_provider_signup, AvailabilityRepository, BookingRepository, MessageRepository,
    ProviderRepository, ReviewRepository, ServiceRepository, SessionRepository, StoreHealth,
    UserRepository,
};
use crate::auth::session::SessionRecord;
use crate::database::schema::types::{BookingStatus, PaymentStatus};
use crate::error::ApiError;
use crate::models::{
    Availability, Booking, BookingChanges, Message, NewAvailability, NewBooking, NewMessage,
    NewProviderProfile, NewReview, NewServiceListing, NewUser, ProviderFilter, ProviderProfile,
    ProviderWithDetails, RatingStats, Review, ServiceFilter, ServiceListing,
    UpdateProviderRequest, UpdateServiceRequest, UpdateUserRequest, User, VerificationRequest,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<SessionRecord>,
    providers: Vec<ProviderProfile>,
    services: Vec<ServiceListing>,
    bookings: Vec<Booking>,
    reviews: Vec<Review>,
    messages: Vec<Message>,
    availability: Vec<Availability>,
}

impl Tables {
    fn details(&self, profile: &ProviderProfile) -> Result<ProviderWithDetails, ApiError> {
        let user = self
            .users
            .iter()
            .find(|u| u.id == profile.user_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::Internal(format!("Provider {} has no owning user", profile.id))
            })?;
        let services = self
            .services
            .iter()
            .filter(|s| s.provider_id == profile.id && s.is_active)
            .cloned()
            .collect();
        Ok(ProviderWithDetails {
            profile: profile.clone(),
            user,
            services,
        })
    }

    fn recompute_job_stats(&mut self, provider_id: Uuid) {
        let completed: Vec<&Booking> = self
            .bookings
            .iter()
            .filter(|b| b.provider_id == provider_id && b.status == BookingStatus::Completed)
            .collect();
        let jobs = completed.len() as i32;
        let earnings: Decimal = completed
            .iter()
            .map(|b| b.final_price.unwrap_or(b.estimated_price))
            .sum();

        if let Some(profile) = self.providers.iter_mut().find(|p| p.id == provider_id) {
            profile.completed_jobs = jobs;
            profile.total_earnings = earnings;
        }
    }

    fn recompute_rating(&mut self, provider_id: Uuid) {
        let ratings: Vec<i32> = self
            .reviews
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .map(|r| r.rating)
            .collect();
        let stats = RatingStats::from_ratings(&ratings);

        if let Some(profile) = self.providers.iter_mut().find(|p| p.id == provider_id) {
            profile.rating = stats.rating;
            profile.review_count = stats.review_count as i32;
        }
    }

    fn slot_taken(&self, new: &NewBooking, ignore: Option<Uuid>) -> bool {
        new.occupies_slot()
            && self
                .bookings
                .iter()
                .filter(|b| Some(b.id) != ignore)
                .any(|b| b.occupies_slot() && b.same_slot(new))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let mut tables = self.tables.write().await;
        let email = new.email.to_lowercase();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(ApiError::already_exists("An account with this email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: Some(new.password_hash),
            first_name: new.first_name,
            last_name: new.last_name,
            profile_image_url: None,
            phone: new.phone,
            role: new.role,
            location: new.location,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: &UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(v) = &changes.first_name {
            user.first_name = Some(v.clone());
        }
        if let Some(v) = &changes.last_name {
            user.last_name = Some(v.clone());
        }
        if let Some(v) = &changes.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &changes.location {
            user.location = Some(v.clone());
        }
        if let Some(v) = &changes.profile_image_url {
            user.profile_image_url = Some(v.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        match tables.sessions.iter_mut().find(|s| s.sid == record.sid) {
            Some(existing) => *existing = record.clone(),
            None => tables.sessions.push(record.clone()),
        }
        Ok(())
    }

    async fn load_session(&self, sid: &str) -> Result<Option<SessionRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.sid == sid).cloned())
    }

    async fn delete_session(&self, sid: &str) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        tables.sessions.retain(|s| s.sid != sid);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, ApiError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.expire >= now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl ProviderRepository for MemoryStore {
    async fn create_provider(&self, new: NewProviderProfile) -> Result<ProviderProfile, ApiError> {
        let mut tables = self.tables.write().await;
        if tables.providers.iter().any(|p| p.user_id == new.user_id) {
            return Err(ApiError::already_exists("Provider profile"));
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == new.user_id) else {
            return Err(ApiError::not_found("User"));
        };
        user.role = role_after_provider_signup(user.role);
        user.updated_at = Utc::now();

        let profile = ProviderProfile {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            bio: new.bio,
            verification_status: Default::default(),
            verification_documents: new.verification_documents,
            tier: Default::default(),
            is_online: new.is_online,
            rating: Decimal::ZERO,
            review_count: 0,
            completed_jobs: 0,
            total_earnings: Decimal::ZERO,
            created_at: Utc::now(),
        };
        tables.providers.push(profile.clone());
        Ok(profile)
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<ProviderProfile>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.providers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_provider_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.providers.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn list_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderWithDetails>, ApiError> {
        let tables = self.tables.read().await;
        let mut result = Vec::new();
        for profile in &tables.providers {
            let details = tables.details(profile)?;
            if filter.matches(&details.profile, &details.user, &details.services) {
                result.push(details);
            }
        }
        Ok(result)
    }

    async fn provider_details(&self, id: Uuid) -> Result<Option<ProviderWithDetails>, ApiError> {
        let tables = self.tables.read().await;
        tables
            .providers
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.details(p))
            .transpose()
    }

    async fn update_provider(
        &self,
        id: Uuid,
        changes: &UpdateProviderRequest,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables.providers.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(bio) = &changes.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(online) = changes.is_online {
            profile.is_online = online;
        }
        if let Some(docs) = &changes.verification_documents {
            profile.verification_documents = Some(docs.clone());
        }
        Ok(Some(profile.clone()))
    }

    async fn set_verification(
        &self,
        id: Uuid,
        request: &VerificationRequest,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables.providers.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        profile.verification_status = request.verification_status;
        if let Some(tier) = request.tier {
            profile.tier = tier;
        }
        Ok(Some(profile.clone()))
    }
}

#[async_trait]
impl ServiceRepository for MemoryStore {
    async fn create_service(&self, new: NewServiceListing) -> Result<ServiceListing, ApiError> {
        let mut tables = self.tables.write().await;
        let listing = ServiceListing {
            id: Uuid::new_v4(),
            provider_id: new.provider_id,
            category: new.category,
            name: new.name,
            description: new.description,
            price: new.price,
            price_unit: new.price_unit,
            is_active: new.is_active,
            created_at: Utc::now(),
        };
        tables.services.push(listing.clone());
        Ok(listing)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<ServiceListing>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().find(|s| s.id == id).cloned())
    }

    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .filter(|s| s.is_active && filter.matches(s))
            .cloned()
            .collect())
    }

    async fn services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceListing>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn update_service(
        &self,
        id: Uuid,
        changes: &UpdateServiceRequest,
    ) -> Result<Option<ServiceListing>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(listing) = tables.services.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(category) = changes.category {
            listing.category = category;
        }
        if let Some(name) = &changes.name {
            listing.name = name.clone();
        }
        if let Some(description) = &changes.description {
            listing.description = Some(description.clone());
        }
        if let Some(price) = changes.price {
            listing.price = price;
        }
        if let Some(unit) = &changes.price_unit {
            listing.price_unit = unit.clone();
        }
        if let Some(active) = changes.is_active {
            listing.is_active = active;
        }
        Ok(Some(listing.clone()))
    }

    async fn delete_service(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut tables = self.tables.write().await;
        if tables.bookings.iter().any(|b| b.service_id == id) {
            return Err(ApiError::Conflict(
                "Service has bookings; deactivate it instead of deleting".to_string(),
            ));
        }
        let before = tables.services.len();
        tables.services.retain(|s| s.id != id);
        Ok(tables.services.len() < before)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, new: NewBooking) -> Result<Booking, ApiError> {
        let mut tables = self.tables.write().await;
        if tables.slot_taken(&new, None) {
            return Err(ApiError::slot_unavailable());
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            provider_id: new.provider_id,
            service_id: new.service_id,
            booking_type: new.booking_type,
            status: BookingStatus::Pending,
            scheduled_date: new.scheduled_date,
            scheduled_time: new.scheduled_time,
            location: new.location,
            notes: new.notes,
            photos: None,
            estimated_price: new.estimated_price,
            final_price: None,
            commission: None,
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn bookings_for_client(&self, client_id: Uuid) -> Result<Vec<Booking>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn update_booking(
        &self,
        id: Uuid,
        changes: &BookingChanges,
    ) -> Result<Option<Booking>, ApiError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .bookings
            .iter()
            .position(|b| b.id == id && b.status == changes.expected_status)
        else {
            return Ok(None);
        };

        let mut updated = tables.bookings[index].clone();
        changes.apply_to(&mut updated);

        if updated.occupies_slot() {
            let slot = NewBooking {
                client_id: updated.client_id,
                provider_id: updated.provider_id,
                service_id: updated.service_id,
                booking_type: updated.booking_type,
                scheduled_date: updated.scheduled_date,
                scheduled_time: updated.scheduled_time.clone(),
                location: updated.location.clone(),
                notes: None,
                estimated_price: updated.estimated_price,
                payment_method: None,
            };
            if tables.slot_taken(&slot, Some(id)) {
                return Err(ApiError::slot_unavailable());
            }
        }

        tables.bookings[index] = updated.clone();
        if changes.changes_status() {
            tables.recompute_job_stats(updated.provider_id);
        }
        Ok(Some(updated))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, new: NewReview) -> Result<Review, ApiError> {
        let mut tables = self.tables.write().await;
        if tables.reviews.iter().any(|r| r.booking_id == new.booking_id) {
            return Err(ApiError::already_exists("A review for this booking"));
        }

        let review = Review {
            id: Uuid::new_v4(),
            booking_id: new.booking_id,
            client_id: new.client_id,
            provider_id: new.provider_id,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        };
        tables.reviews.push(review.clone());
        tables.recompute_rating(new.provider_id);
        Ok(review)
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.booking_id == booking_id)
            .cloned())
    }

    async fn reviewed_booking_ids(&self, client_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.client_id == client_id)
            .map(|r| r.booking_id)
            .collect())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create_message(&self, new: NewMessage) -> Result<Message, ApiError> {
        let mut tables = self.tables.write().await;
        let message = Message {
            id: Uuid::new_v4(),
            booking_id: new.booking_id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            content: new.content,
            is_read: false,
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn messages_for_booking(&self, booking_id: Uuid) -> Result<Vec<Message>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn mark_message_read(&self, id: Uuid) -> Result<Option<Message>, ApiError> {
        let mut tables = self.tables.write().await;
        Ok(tables.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.is_read = true;
            m.clone()
        }))
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn create_availability(&self, new: NewAvailability) -> Result<Availability, ApiError> {
        let mut tables = self.tables.write().await;
        let slot = Availability {
            id: Uuid::new_v4(),
            provider_id: new.provider_id,
            day_of_week: new.day_of_week,
            start_time: new.start_time,
            end_time: new.end_time,
            is_available: new.is_available,
        };
        tables.availability.push(slot.clone());
        Ok(slot)
    }

    async fn find_availability(&self, id: Uuid) -> Result<Option<Availability>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.availability.iter().find(|a| a.id == id).cloned())
    }

    async fn availability_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Availability>, ApiError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<Availability> = tables
            .availability
            .iter()
            .filter(|a| a.provider_id == provider_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| {
            a.day_of_week
                .cmp(&b.day_of_week)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        Ok(slots)
    }

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut tables = self.tables.write().await;
        let before = tables.availability.len();
        tables.availability.retain(|a| a.id != id);
        Ok(tables.availability.len() < before)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::types::{BookingType, ServiceCategory, UserRole};

    async fn seed(store: &MemoryStore) -> (User, ProviderProfile, ServiceListing) {
        let client = store
            .create_user(NewUser {
                email: "Client@Example.com".into(),
                password_hash: "x".into(),
                first_name: Some("Amina".into()),
                last_name: None,
                phone: None,
                location: Some("Kampala".into()),
                role: UserRole::Client,
            })
            .await
            .unwrap();
        let owner = store
            .create_user(NewUser {
                email: "rider@example.com".into(),
                password_hash: "x".into(),
                first_name: Some("Okello".into()),
                last_name: None,
                phone: None,
                location: Some("Kampala Central".into()),
                role: UserRole::Client,
            })
            .await
            .unwrap();
        let profile = store
            .create_provider(NewProviderProfile {
                user_id: owner.id,
                bio: None,
                verification_documents: None,
                is_online: true,
            })
            .await
            .unwrap();
        let service = store
            .create_service(NewServiceListing {
                provider_id: profile.id,
                category: ServiceCategory::Transport,
                name: "Boda ride".into(),
                description: None,
                price: Decimal::from(5000),
                price_unit: "per trip".into(),
                is_active: true,
            })
            .await
            .unwrap();
        (client, profile, service)
    }

    fn scheduled(client: &User, profile: &ProviderProfile, service: &ServiceListing) -> NewBooking {
        NewBooking {
            client_id: client.id,
            provider_id: profile.id,
            service_id: service.id,
            booking_type: BookingType::Scheduled,
            scheduled_date: Some(
                DateTime::parse_from_rfc3339("2026-11-02T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            scheduled_time: Some("09:00".into()),
            location: "Ntinda".into(),
            notes: None,
            estimated_price: Decimal::from(5000),
            payment_method: None,
        }
    }

    #[tokio::test]
    async fn test_emails_are_unique_case_insensitively() {
        let store = MemoryStore::new();
        seed(&store).await;
        let dup = store
            .create_user(NewUser {
                email: "client@example.com".into(),
                password_hash: "x".into(),
                first_name: None,
                last_name: None,
                phone: None,
                location: None,
                role: UserRole::Client,
            })
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_provider_signup_promotes_role() {
        let store = MemoryStore::new();
        let (_, profile, _) = seed(&store).await;
        let owner = store.find_user(profile.user_id).await.unwrap().unwrap();
        assert_eq!(owner.role, UserRole::Provider);
    }

    #[tokio::test]
    async fn test_live_slot_cannot_be_double_booked() {
        let store = MemoryStore::new();
        let (client, profile, service) = seed(&store).await;

        let first = store
            .create_booking(scheduled(&client, &profile, &service))
            .await
            .unwrap();
        let second = store
            .create_booking(scheduled(&client, &profile, &service))
            .await;
        assert!(matches!(second, Err(ref e) if e.error_code() == crate::error::ErrorCode::SlotUnavailable));

        // Cancelling frees the slot.
        store
            .update_booking(
                first.id,
                &BookingChanges {
                    expected_status: BookingStatus::Pending,
                    status: Some(BookingStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(store
            .create_booking(scheduled(&client, &profile, &service))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_stale_expected_status_is_not_applied() {
        let store = MemoryStore::new();
        let (client, profile, service) = seed(&store).await;
        let booking = store
            .create_booking(scheduled(&client, &profile, &service))
            .await
            .unwrap();

        let stale = store
            .update_booking(
                booking.id,
                &BookingChanges {
                    expected_status: BookingStatus::Confirmed,
                    status: Some(BookingStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(stale.is_none());
        let stored = store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_completion_recomputes_job_stats() {
        let store = MemoryStore::new();
        let (client, profile, service) = seed(&store).await;
        let booking = store
            .create_booking(scheduled(&client, &profile, &service))
            .await
            .unwrap();

        store
            .update_booking(
                booking.id,
                &BookingChanges {
                    expected_status: BookingStatus::Pending,
                    status: Some(BookingStatus::Completed),
                    final_price: Some(Decimal::from(7000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = store.find_provider(profile.id).await.unwrap().unwrap();
        assert_eq!(profile.completed_jobs, 1);
        assert_eq!(profile.total_earnings, Decimal::from(7000));
    }

    #[tokio::test]
    async fn test_review_recomputes_rating() {
        let store = MemoryStore::new();
        let (client, profile, service) = seed(&store).await;
        let booking = store
            .create_booking(scheduled(&client, &profile, &service))
            .await
            .unwrap();

        store
            .create_review(NewReview {
                booking_id: booking.id,
                client_id: client.id,
                provider_id: profile.id,
                rating: 4,
                comment: None,
            })
            .await
            .unwrap();
        let again = store
            .create_review(NewReview {
                booking_id: booking.id,
                client_id: client.id,
                provider_id: profile.id,
                rating: 1,
                comment: None,
            })
            .await;
        assert!(again.is_err());

        let profile = store.find_provider(profile.id).await.unwrap().unwrap();
        assert_eq!(profile.review_count, 1);
        assert_eq!(profile.rating, Decimal::from(4));
    }

    #[tokio::test]
    async fn test_provider_filters() {
        let store = MemoryStore::new();
        let (_, profile, _) = seed(&store).await;

        let by_location = store
            .list_providers(&ProviderFilter {
                location: Some("kampala".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_location.len(), 1);
        assert_eq!(by_location[0].profile.id, profile.id);
        assert_eq!(by_location[0].services.len(), 1);

        let health = store
            .list_providers(&ProviderFilter {
                category: Some(ServiceCategory::Health),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(health.is_empty());

        let verified = store
            .list_providers(&ProviderFilter {
                verified: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(verified.is_empty());
    }
}
