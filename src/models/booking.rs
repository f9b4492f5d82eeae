use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::database::schema::types::{BookingStatus, BookingType, PaymentStatus};

pub const DEFAULT_LOCATION: &str = "Not specified";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub scheduled_time: Option<String>,
    pub location: String,
    pub notes: Option<String>,
    pub photos: Option<serde_json::Value>,
    #[schema(value_type = String)]
    pub estimated_price: Decimal,
    #[schema(value_type = Option<String>)]
    pub final_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub commission: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// True when this booking holds the provider's scheduled slot. A slot
    /// needs both a date and a time.
    pub fn occupies_slot(&self) -> bool {
        self.booking_type == BookingType::Scheduled
            && self.scheduled_date.is_some()
            && self.scheduled_time.is_some()
            && self.status.is_live()
    }

    pub fn same_slot(&self, other: &NewBooking) -> bool {
        self.provider_id == other.provider_id
            && self.scheduled_date == other.scheduled_date
            && self.scheduled_time == other.scheduled_time
    }
}

/// Body of `POST /api/bookings`. The client is the session user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10))]
    pub scheduled_time: Option<String>,
    #[schema(value_type = String)]
    pub estimated_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub booking_type: BookingType,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub scheduled_time: Option<String>,
    pub location: String,
    pub notes: Option<String>,
    pub estimated_price: Decimal,
    pub payment_method: Option<String>,
}

impl NewBooking {
    pub fn occupies_slot(&self) -> bool {
        self.booking_type == BookingType::Scheduled
            && self.scheduled_date.is_some()
            && self.scheduled_time.is_some()
    }
}

/// Body of `PUT /api/bookings/{id}`. Price settlement fields are server-computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateBookingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub final_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 500))]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10))]
    pub scheduled_time: Option<String>,
}

impl UpdateBookingRequest {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Resolved write applied by the store. `expected_status` guards against
/// a concurrent transition landing between read and write.
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub expected_status: BookingStatus,
    pub status: Option<BookingStatus>,
    pub final_price: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub scheduled_time: Option<String>,
}

impl BookingChanges {
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(status) = self.status {
            booking.status = status;
        }
        if let Some(price) = self.final_price {
            booking.final_price = Some(price);
        }
        if let Some(commission) = self.commission {
            booking.commission = Some(commission);
        }
        if let Some(at) = self.completed_at {
            booking.completed_at = Some(at);
        }
        if let Some(method) = &self.payment_method {
            booking.payment_method = Some(method.clone());
        }
        if let Some(payment) = self.payment_status {
            booking.payment_status = payment;
        }
        if let Some(notes) = &self.notes {
            booking.notes = Some(notes.clone());
        }
        if let Some(location) = &self.location {
            booking.location = location.clone();
        }
        if let Some(date) = self.scheduled_date {
            booking.scheduled_date = Some(date);
        }
        if let Some(time) = &self.scheduled_time {
            booking.scheduled_time = Some(time.clone());
        }
    }

    /// Whether this write moves the booking into a different status.
    pub fn changes_status(&self) -> bool {
        self.status.is_some_and(|s| s != self.expected_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_wire_names() {
        let body = r#"{
            "providerId": "6c7d1f64-6a34-4f43-9a55-4f1d2b2d5e11",
            "serviceId": "0e8f3c0a-2f0b-46bb-9d0c-3b7a4b0f7d22",
            "type": "instant",
            "location": "Kampala",
            "estimatedPrice": "15000"
        }"#;
        let req: CreateBookingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.booking_type, BookingType::Instant);
        assert_eq!(req.estimated_price, Decimal::from(15000));
        assert!(req.scheduled_date.is_none());
    }

    #[test]
    fn test_price_accepts_json_number() {
        let body = r#"{
            "providerId": "6c7d1f64-6a34-4f43-9a55-4f1d2b2d5e11",
            "serviceId": "0e8f3c0a-2f0b-46bb-9d0c-3b7a4b0f7d22",
            "type": "scheduled",
            "estimatedPrice": 25000.5
        }"#;
        let req: CreateBookingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.estimated_price, Decimal::new(250005, 1));
    }

    #[test]
    fn test_update_rejects_server_computed_fields() {
        assert!(serde_json::from_str::<UpdateBookingRequest>(r#"{"commission":"10"}"#).is_err());
        assert!(serde_json::from_str::<UpdateBookingRequest>(r#"{"clientId":"x"}"#).is_err());
    }

    #[test]
    fn test_same_status_is_not_a_change() {
        let changes = BookingChanges {
            expected_status: BookingStatus::Confirmed,
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        };
        assert!(!changes.changes_status());
    }
}
