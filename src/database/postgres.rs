//! Postgres-backed [`Store`](super::repository::Store).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use super::repository::{
    AvailabilityRepository, BookingRepository, MessageRepository, ProviderRepository,
    ReviewRepository, ServiceRepository, SessionRepository, StoreHealth, Transaction,
    UserRepository,
};
use super::DatabasePool;
use crate::auth::session::{SessionData, SessionRecord};
use crate::error::ApiError;
use crate::models::{
    Availability, Booking, BookingChanges, Message, NewAvailability, NewBooking, NewMessage,
    NewProviderProfile, NewReview, NewServiceListing, NewUser, ProviderFilter, ProviderProfile,
    ProviderWithDetails, Review, ServiceFilter, ServiceListing, UpdateProviderRequest,
    UpdateServiceRequest, UpdateUserRequest, User, VerificationRequest,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DatabasePool,
}

impl PgStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn with_details(
        &self,
        profiles: Vec<ProviderProfile>,
    ) -> Result<Vec<ProviderWithDetails>, ApiError> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
        let provider_ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();

        let users: HashMap<Uuid, User> =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
                .bind(&user_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect();

        let mut services: HashMap<Uuid, Vec<ServiceListing>> = HashMap::new();
        let listings = sqlx::query_as::<_, ServiceListing>(
            "SELECT * FROM services WHERE provider_id = ANY($1) AND is_active ORDER BY created_at",
        )
        .bind(&provider_ids)
        .fetch_all(&self.pool)
        .await?;
        for listing in listings {
            services.entry(listing.provider_id).or_default().push(listing);
        }

        let mut details = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let user = users.get(&profile.user_id).cloned().ok_or_else(|| {
                ApiError::Internal(format!("Provider {} has no owning user", profile.id))
            })?;
            let services = services.remove(&profile.id).unwrap_or_default();
            details.push(ProviderWithDetails {
                profile,
                user,
                services,
            });
        }
        Ok(details)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

const RECOMPUTE_JOB_STATS: &str = r#"
    UPDATE provider_profiles p
    SET completed_jobs = s.jobs,
        total_earnings = s.earnings
    FROM (
        SELECT COUNT(*)::int AS jobs,
               COALESCE(SUM(COALESCE(final_price, estimated_price)), 0) AS earnings
        FROM bookings
        WHERE provider_id = $1 AND status = 'completed'
    ) s
    WHERE p.id = $1
"#;

const RECOMPUTE_RATING: &str = r#"
    UPDATE provider_profiles p
    SET rating = s.rating,
        review_count = s.reviews
    FROM (
        SELECT COALESCE(ROUND(AVG(rating)::numeric, 2), 0) AS rating,
               COUNT(*)::int AS reviews
        FROM reviews
        WHERE provider_id = $1
    ) s
    WHERE p.id = $1
"#;

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone, location, role)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .bind(&new.location)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::already_exists("An account with this email")
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: &UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                location = COALESCE($5, location),
                profile_image_url = COALESCE($6, profile_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.phone)
        .bind(&changes.location)
        .bind(&changes.profile_image_url)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, sess, expire)
            VALUES ($1, $2, $3)
            ON CONFLICT (sid) DO UPDATE SET sess = EXCLUDED.sess, expire = EXCLUDED.expire
            "#,
        )
        .bind(&record.sid)
        .bind(Json(SessionData {
            user_id: record.user_id,
        }))
        .bind(record.expire)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_session(&self, sid: &str) -> Result<Option<SessionRecord>, ApiError> {
        let row: Option<(String, Json<SessionData>, DateTime<Utc>)> =
            sqlx::query_as("SELECT sid, sess, expire FROM sessions WHERE sid = $1")
                .bind(sid)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(sid, Json(data), expire)| SessionRecord {
            sid,
            user_id: data.user_id,
            expire,
        }))
    }

    async fn delete_session(&self, sid: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expire < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProviderRepository for PgStore {
    async fn create_provider(&self, new: NewProviderProfile) -> Result<ProviderProfile, ApiError> {
        let mut tx = Transaction::begin(&self.pool).await?;

        let profile = sqlx::query_as::<_, ProviderProfile>(
            r#"
            INSERT INTO provider_profiles (id, user_id, bio, verification_documents, is_online)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.bio)
        .bind(&new.verification_documents)
        .bind(new.is_online)
        .fetch_one(&mut **tx.inner())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::already_exists("Provider profile")
            } else {
                ApiError::from(e)
            }
        })?;

        sqlx::query(
            "UPDATE users SET role = 'provider', updated_at = NOW() WHERE id = $1 AND role <> 'admin'",
        )
        .bind(new.user_id)
        .execute(&mut **tx.inner())
        .await?;

        tx.commit().await?;
        Ok(profile)
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<ProviderProfile>, ApiError> {
        Ok(
            sqlx::query_as::<_, ProviderProfile>("SELECT * FROM provider_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_provider_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        Ok(sqlx::query_as::<_, ProviderProfile>(
            "SELECT * FROM provider_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderWithDetails>, ApiError> {
        let profiles = sqlx::query_as::<_, ProviderProfile>(
            r#"
            SELECT p.*
            FROM provider_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE ($1::uuid IS NULL OR p.user_id = $1)
              AND ($2::bool IS NULL OR (p.verification_status = 'verified') = $2)
              AND ($3::bool IS NULL OR p.is_online = $3)
              AND ($4::text IS NULL OR u.location ILIKE '%' || $4 || '%')
              AND ($5::service_category IS NULL OR EXISTS (
                    SELECT 1 FROM services s
                    WHERE s.provider_id = p.id AND s.is_active AND s.category = $5))
            ORDER BY p.created_at
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.verified)
        .bind(filter.is_online)
        .bind(&filter.location)
        .bind(filter.category)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = profiles.len(), "Loaded provider profiles");
        self.with_details(profiles).await
    }

    async fn provider_details(&self, id: Uuid) -> Result<Option<ProviderWithDetails>, ApiError> {
        let Some(profile) = self.find_provider(id).await? else {
            return Ok(None);
        };
        Ok(self.with_details(vec![profile]).await?.pop())
    }

    async fn update_provider(
        &self,
        id: Uuid,
        changes: &UpdateProviderRequest,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        Ok(sqlx::query_as::<_, ProviderProfile>(
            r#"
            UPDATE provider_profiles
            SET bio = COALESCE($2, bio),
                is_online = COALESCE($3, is_online),
                verification_documents = COALESCE($4, verification_documents)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.bio)
        .bind(changes.is_online)
        .bind(&changes.verification_documents)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_verification(
        &self,
        id: Uuid,
        request: &VerificationRequest,
    ) -> Result<Option<ProviderProfile>, ApiError> {
        Ok(sqlx::query_as::<_, ProviderProfile>(
            r#"
            UPDATE provider_profiles
            SET verification_status = $2,
                tier = COALESCE($3, tier)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.verification_status)
        .bind(request.tier)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ServiceRepository for PgStore {
    async fn create_service(&self, new: NewServiceListing) -> Result<ServiceListing, ApiError> {
        Ok(sqlx::query_as::<_, ServiceListing>(
            r#"
            INSERT INTO services (id, provider_id, category, name, description, price, price_unit, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.provider_id)
        .bind(new.category)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.price_unit)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<ServiceListing>, ApiError> {
        Ok(
            sqlx::query_as::<_, ServiceListing>("SELECT * FROM services WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>, ApiError> {
        Ok(sqlx::query_as::<_, ServiceListing>(
            r#"
            SELECT * FROM services
            WHERE is_active
              AND ($1::service_category IS NULL OR category = $1)
              AND ($2::uuid IS NULL OR provider_id = $2)
            ORDER BY created_at
            "#,
        )
        .bind(filter.category)
        .bind(filter.provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceListing>, ApiError> {
        Ok(sqlx::query_as::<_, ServiceListing>(
            "SELECT * FROM services WHERE provider_id = $1 ORDER BY created_at",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_service(
        &self,
        id: Uuid,
        changes: &UpdateServiceRequest,
    ) -> Result<Option<ServiceListing>, ApiError> {
        Ok(sqlx::query_as::<_, ServiceListing>(
            r#"
            UPDATE services
            SET category = COALESCE($2, category),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                price_unit = COALESCE($6, price_unit),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.category)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(&changes.price_unit)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_service(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    ApiError::Conflict(
                        "Service has bookings; deactivate it instead of deleting".to_string(),
                    )
                } else {
                    ApiError::from(e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn create_booking(&self, new: NewBooking) -> Result<Booking, ApiError> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, client_id, provider_id, service_id, type, status,
                scheduled_date, scheduled_time, location, notes,
                estimated_price, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.client_id)
        .bind(new.provider_id)
        .bind(new.service_id)
        .bind(new.booking_type)
        .bind(new.scheduled_date)
        .bind(&new.scheduled_time)
        .bind(&new.location)
        .bind(&new.notes)
        .bind(new.estimated_price)
        .bind(&new.payment_method)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::slot_unavailable()
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError> {
        Ok(
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn bookings_for_client(&self, client_id: Uuid) -> Result<Vec<Booking>, ApiError> {
        Ok(sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn bookings_for_provider(&self, provider_id: Uuid) -> Result<Vec<Booking>, ApiError> {
        Ok(sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE provider_id = $1 ORDER BY created_at",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_booking(
        &self,
        id: Uuid,
        changes: &BookingChanges,
    ) -> Result<Option<Booking>, ApiError> {
        let mut tx = Transaction::begin(&self.pool).await?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = COALESCE($3, status),
                final_price = COALESCE($4, final_price),
                commission = COALESCE($5, commission),
                completed_at = COALESCE($6, completed_at),
                payment_method = COALESCE($7, payment_method),
                payment_status = COALESCE($8, payment_status),
                notes = COALESCE($9, notes),
                location = COALESCE($10, location),
                scheduled_date = COALESCE($11, scheduled_date),
                scheduled_time = COALESCE($12, scheduled_time)
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.expected_status)
        .bind(changes.status)
        .bind(changes.final_price)
        .bind(changes.commission)
        .bind(changes.completed_at)
        .bind(&changes.payment_method)
        .bind(changes.payment_status)
        .bind(&changes.notes)
        .bind(&changes.location)
        .bind(changes.scheduled_date)
        .bind(&changes.scheduled_time)
        .fetch_optional(&mut **tx.inner())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::slot_unavailable()
            } else {
                ApiError::from(e)
            }
        })?;

        let Some(booking) = updated else {
            return Ok(None);
        };

        if changes.changes_status() {
            sqlx::query(RECOMPUTE_JOB_STATS)
                .bind(booking.provider_id)
                .execute(&mut **tx.inner())
                .await?;
        }

        tx.commit().await?;
        Ok(Some(booking))
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create_review(&self, new: NewReview) -> Result<Review, ApiError> {
        let mut tx = Transaction::begin(&self.pool).await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, booking_id, client_id, provider_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.booking_id)
        .bind(new.client_id)
        .bind(new.provider_id)
        .bind(new.rating)
        .bind(&new.comment)
        .fetch_one(&mut **tx.inner())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::already_exists("A review for this booking")
            } else {
                ApiError::from(e)
            }
        })?;

        sqlx::query(RECOMPUTE_RATING)
            .bind(new.provider_id)
            .execute(&mut **tx.inner())
            .await?;

        tx.commit().await?;
        Ok(review)
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>, ApiError> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE provider_id = $1 ORDER BY created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>, ApiError> {
        Ok(
            sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn reviewed_booking_ids(&self, client_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        Ok(
            sqlx::query_scalar::<_, Uuid>("SELECT booking_id FROM reviews WHERE client_id = $1")
                .bind(client_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl MessageRepository for PgStore {
    async fn create_message(&self, new: NewMessage) -> Result<Message, ApiError> {
        Ok(sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, booking_id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.booking_id)
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, ApiError> {
        Ok(
            sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn messages_for_booking(&self, booking_id: Uuid) -> Result<Vec<Message>, ApiError> {
        Ok(sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_message_read(&self, id: Uuid) -> Result<Option<Message>, ApiError> {
        Ok(sqlx::query_as::<_, Message>(
            "UPDATE messages SET is_read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl AvailabilityRepository for PgStore {
    async fn create_availability(&self, new: NewAvailability) -> Result<Availability, ApiError> {
        Ok(sqlx::query_as::<_, Availability>(
            r#"
            INSERT INTO availability (id, provider_id, day_of_week, start_time, end_time, is_available)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.provider_id)
        .bind(new.day_of_week)
        .bind(&new.start_time)
        .bind(&new.end_time)
        .bind(new.is_available)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_availability(&self, id: Uuid) -> Result<Option<Availability>, ApiError> {
        Ok(
            sqlx::query_as::<_, Availability>("SELECT * FROM availability WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn availability_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Availability>, ApiError> {
        Ok(sqlx::query_as::<_, Availability>(
            "SELECT * FROM availability WHERE provider_id = $1 ORDER BY day_of_week, start_time",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM availability WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
