//! Three-step booking form: type, then details, then confirmation.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::schema::types::BookingType;
use crate::models::{CreateBookingRequest, DEFAULT_LOCATION};

static PRICE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d,]+").expect("valid price pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    Type,
    Details,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Booking can only be submitted from the confirm step (currently at {0:?})")]
    NotReady(WizardStep),
    #[error("No price found in \"{0}\"")]
    MissingPrice(String),
}

/// Pulls the first number out of a display label: "UGX 15,000" is 15000.
pub fn parse_price_label(label: &str) -> Option<Decimal> {
    let digits = PRICE_DIGITS.find(label)?.as_str().replace(',', "");
    digits.parse().ok()
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    provider_id: Uuid,
    service_id: Uuid,
    price_label: String,
    step: WizardStep,
    booking_type: BookingType,
    location: String,
    notes: String,
    scheduled_date: Option<NaiveDate>,
    scheduled_time: String,
}

impl BookingWizard {
    pub fn new(provider_id: Uuid, service_id: Uuid, price_label: impl Into<String>) -> Self {
        Self {
            provider_id,
            service_id,
            price_label: price_label.into(),
            step: WizardStep::Type,
            booking_type: BookingType::Instant,
            location: String::new(),
            notes: String::new(),
            scheduled_date: None,
            scheduled_time: String::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn booking_type(&self) -> BookingType {
        self.booking_type
    }

    pub fn select_type(&mut self, booking_type: BookingType) {
        self.booking_type = booking_type;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn set_schedule(&mut self, date: Option<NaiveDate>, time: impl Into<String>) {
        self.scheduled_date = date;
        self.scheduled_time = time.into();
    }

    /// Advances one step; stays put on the confirm step.
    pub fn next(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Type => WizardStep::Details,
            WizardStep::Details | WizardStep::Confirm => WizardStep::Confirm,
        };
        self.step
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Type | WizardStep::Details => WizardStep::Type,
            WizardStep::Confirm => WizardStep::Details,
        };
        self.step
    }

    /// Clears the form after a successful submit or when the dialog closes.
    pub fn reset(&mut self) {
        *self = Self::new(self.provider_id, self.service_id, self.price_label.clone());
    }

    /// Builds the request body; schedule fields are only sent for scheduled bookings.
    pub fn request(&self) -> Result<CreateBookingRequest, WizardError> {
        if self.step != WizardStep::Confirm {
            return Err(WizardError::NotReady(self.step));
        }
        let estimated_price = parse_price_label(&self.price_label)
            .ok_or_else(|| WizardError::MissingPrice(self.price_label.clone()))?;

        let location = match self.location.trim() {
            "" => DEFAULT_LOCATION.to_string(),
            location => location.to_string(),
        };
        let scheduled = self.booking_type == BookingType::Scheduled;

        Ok(CreateBookingRequest {
            provider_id: self.provider_id,
            service_id: self.service_id,
            booking_type: self.booking_type,
            location: Some(location),
            notes: non_empty(&self.notes),
            scheduled_date: self
                .scheduled_date
                .filter(|_| scheduled)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            scheduled_time: non_empty(&self.scheduled_time).filter(|_| scheduled),
            estimated_price,
            payment_method: None,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
