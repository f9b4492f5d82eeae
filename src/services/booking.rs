//! Booking lifecycle: creation, participant-scoped reads and guarded status
//! transitions with settlement on completion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{booking_party, own_provider_profile};
use crate::auth::CurrentUser;
use crate::constants::pricing::{COMMISSION_RATE, MAX_AMOUNT, MONEY_SCALE};
use crate::database::repository::{BookingRepository, ProviderRepository, ServiceRepository};
use crate::database::schema::types::{BookingStatus, BookingType};
use crate::database::Store;
use crate::error::{ApiError, ErrorCode};
use crate::models::{
    Booking, BookingChanges, CreateBookingRequest, NewBooking, UpdateBookingRequest,
    DEFAULT_LOCATION,
};

/// Rounds to cents, halves away from zero (same as Postgres `ROUND`).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Platform cut of a settled price.
pub fn commission_for(final_price: Decimal) -> Decimal {
    round_money(final_price * COMMISSION_RATE)
}

/// Money must be positive and fit NUMERIC(10, 2).
pub fn validate_amount(field: &str, amount: Decimal) -> Result<Decimal, ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::ValidationWithField {
            code: ErrorCode::InvalidAmount,
            field: field.to_string(),
            message: format!("{} must be greater than zero", field),
        });
    }
    let rounded = round_money(amount);
    if rounded > MAX_AMOUNT {
        return Err(ApiError::ValidationWithField {
            code: ErrorCode::InvalidAmount,
            field: field.to_string(),
            message: format!("{} is too large", field),
        });
    }
    Ok(rounded)
}

/// Turns a partial update into the write the store applies.
///
/// Rejects moves the transition table does not allow. Entering `completed`
/// stamps `completed_at` and settles the price: `final_price` falls back to
/// the estimate and `commission` is 10% of it.
pub fn plan_update(
    booking: &Booking,
    request: &UpdateBookingRequest,
    now: DateTime<Utc>,
) -> Result<BookingChanges, ApiError> {
    let current = booking.status;
    let next = request.status.filter(|s| *s != current);

    if let Some(next) = next {
        if !current.can_transition_to(next) {
            return Err(ApiError::InvalidTransition {
                from: current,
                to: next,
            });
        }
    }

    let final_price = request
        .final_price
        .map(|p| validate_amount("finalPrice", p))
        .transpose()?;
    if final_price.is_some() && current.is_terminal() {
        return Err(ApiError::validation_field(
            "finalPrice",
            format!("finalPrice cannot change once a booking is {}", current),
        ));
    }

    let location = request.location.as_ref().map(|l| l.trim().to_string());
    if location.as_deref() == Some("") {
        return Err(ApiError::validation_field(
            "location",
            "location cannot be blank",
        ));
    }

    let mut changes = BookingChanges {
        expected_status: current,
        status: next,
        final_price,
        payment_method: request.payment_method.clone(),
        payment_status: request.payment_status,
        notes: request.notes.clone(),
        location,
        scheduled_date: request.scheduled_date,
        scheduled_time: request.scheduled_time.clone(),
        ..Default::default()
    };

    if next == Some(BookingStatus::Completed) {
        let settled = final_price
            .or(booking.final_price)
            .unwrap_or(booking.estimated_price);
        changes.final_price = Some(settled);
        changes.commission = Some(commission_for(settled));
        changes.completed_at = Some(now);
    }

    Ok(changes)
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateBookingRequest,
    ) -> Result<Booking, ApiError> {
        request.validate()?;
        let estimated_price = validate_amount("estimatedPrice", request.estimated_price)?;

        let provider = self
            .store
            .find_provider(request.provider_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))?;
        if provider.user_id == caller.id {
            return Err(ApiError::BadRequest(
                "You cannot book your own service".to_string(),
            ));
        }

        let service = self
            .store
            .find_service(request.service_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Service"))?;
        if service.provider_id != provider.id {
            return Err(ApiError::validation_field(
                "serviceId",
                "Service is not offered by this provider",
            ));
        }
        if !service.is_active {
            return Err(ApiError::validation_field(
                "serviceId",
                "Service is not currently offered",
            ));
        }

        let location = request
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let (scheduled_date, scheduled_time) = match request.booking_type {
            BookingType::Scheduled => (request.scheduled_date, request.scheduled_time),
            BookingType::Instant => (None, None),
        };

        let booking = self
            .store
            .create_booking(NewBooking {
                client_id: caller.id,
                provider_id: provider.id,
                service_id: service.id,
                booking_type: request.booking_type,
                scheduled_date,
                scheduled_time,
                location,
                notes: request.notes,
                estimated_price,
                payment_method: request.payment_method,
            })
            .await?;

        let kind = match booking.booking_type {
            BookingType::Instant => "instant",
            BookingType::Scheduled => "scheduled",
        };
        metrics::counter!("bookings_created_total", "type" => kind).increment(1);
        info!(
            booking_id = %booking.id,
            client_id = %caller.id,
            provider_id = %booking.provider_id,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn for_client(&self, caller: &CurrentUser) -> Result<Vec<Booking>, ApiError> {
        self.store.bookings_for_client(caller.id).await
    }

    pub async fn for_provider(&self, caller: &CurrentUser) -> Result<Vec<Booking>, ApiError> {
        let profile = own_provider_profile(self.store.as_ref(), caller.id).await?;
        self.store.bookings_for_provider(profile.id).await
    }

    pub async fn get(&self, caller: &CurrentUser, id: Uuid) -> Result<Booking, ApiError> {
        let booking = self.find(id).await?;
        booking_party(self.store.as_ref(), caller, &booking).await?;
        Ok(booking)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<Booking, ApiError> {
        request.validate()?;
        let booking = self.find(id).await?;
        booking_party(self.store.as_ref(), caller, &booking).await?;

        let changes = plan_update(&booking, &request, Utc::now())?;
        let updated = self
            .store
            .update_booking(id, &changes)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict(
                    "Booking was modified by someone else; reload and try again".to_string(),
                )
            })?;

        if changes.changes_status() {
            metrics::counter!(
                "booking_transitions_total",
                "from" => booking.status.as_str(),
                "to" => updated.status.as_str()
            )
            .increment(1);
            info!(
                booking_id = %id,
                from = %booking.status,
                to = %updated.status,
                actor = %caller.id,
                "Booking status changed"
            );
        }
        Ok(updated)
    }

    async fn find(&self, id: Uuid) -> Result<Booking, ApiError> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::types::PaymentStatus;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            booking_type: BookingType::Instant,
            status,
            scheduled_date: None,
            scheduled_time: None,
            location: "Kampala".to_string(),
            notes: None,
            photos: None,
            estimated_price: Decimal::from(15000),
            final_price: None,
            commission: None,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_backwards_move_rejected() {
        let err = plan_update(
            &booking(BookingStatus::Confirmed),
            &UpdateBookingRequest::status(BookingStatus::Pending),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_same_status_is_noop() {
        let changes = plan_update(
            &booking(BookingStatus::Confirmed),
            &UpdateBookingRequest::status(BookingStatus::Confirmed),
            Utc::now(),
        )
        .unwrap();
        assert!(changes.status.is_none());
        assert!(!changes.changes_status());
    }

    #[test]
    fn test_completion_settles_estimate() {
        let now = Utc::now();
        let changes = plan_update(
            &booking(BookingStatus::InProgress),
            &UpdateBookingRequest::status(BookingStatus::Completed),
            now,
        )
        .unwrap();
        assert_eq!(changes.final_price, Some(Decimal::from(15000)));
        assert_eq!(changes.commission, Some(Decimal::from(1500)));
        assert_eq!(changes.completed_at, Some(now));
    }

    #[test]
    fn test_completion_uses_supplied_final_price() {
        let request = UpdateBookingRequest {
            status: Some(BookingStatus::Completed),
            final_price: Some(Decimal::new(1999, 2)),
            ..Default::default()
        };
        let changes = plan_update(&booking(BookingStatus::Disputed), &request, Utc::now()).unwrap();
        assert_eq!(changes.final_price, Some(Decimal::new(1999, 2)));
        assert_eq!(changes.commission, Some(Decimal::new(200, 2)));
    }

    #[test]
    fn test_terminal_price_frozen() {
        let request = UpdateBookingRequest {
            final_price: Some(Decimal::from(1)),
            ..Default::default()
        };
        assert!(plan_update(&booking(BookingStatus::Completed), &request, Utc::now()).is_err());
    }

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount("estimatedPrice", Decimal::ZERO).is_err());
        assert!(validate_amount("estimatedPrice", Decimal::from(-5)).is_err());
        assert!(validate_amount("estimatedPrice", Decimal::from(10_000_000_000i64)).is_err());
        assert_eq!(
            validate_amount("estimatedPrice", Decimal::new(12345, 3)).unwrap(),
            Decimal::new(1235, 2)
        );
    }

    #[test]
    fn test_blank_location_rejected_on_update() {
        let request = UpdateBookingRequest {
            location: Some("   ".to_string()),
            ..Default::default()
        };
        let err = plan_update(&booking(BookingStatus::Pending), &request, Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidInput);
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let request = UpdateBookingRequest {
            location: Some("  Ntinda ".to_string()),
            ..Default::default()
        };
        let changes = plan_update(&booking(BookingStatus::Pending), &request, Utc::now()).unwrap();
        assert_eq!(changes.location.as_deref(), Some("Ntinda"));
    }

    #[test]
    fn test_commission_rounds_half_cents_up() {
        assert_eq!(commission_for(Decimal::new(1225, 2)), Decimal::new(123, 2));
        assert_eq!(commission_for(Decimal::new(5, 2)), Decimal::new(1, 2));
        assert_eq!(commission_for(Decimal::new(15, 2)), Decimal::new(2, 2));
        assert_eq!(commission_for(Decimal::new(15000000, 2)), Decimal::new(1500000, 2));
    }
}
