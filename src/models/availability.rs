use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid HH:MM pattern"));

fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    if CLOCK_TIME.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("clock_time");
        err.message = Some("Time must be HH:MM (24-hour)".into());
        Err(err)
    }
}

/// A weekly window in which a provider accepts work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: Uuid,
    pub provider_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityRequest {
    #[validate(range(min = 0, max = 6, message = "dayOfWeek must be between 0 and 6"))]
    pub day_of_week: i32,
    #[validate(custom(function = "validate_clock_time"))]
    pub start_time: String,
    #[validate(custom(function = "validate_clock_time"))]
    pub end_time: String,
    pub is_available: Option<bool>,
}

impl CreateAvailabilityRequest {
    /// Zero-padded HH:MM strings order the same way as the times they denote.
    pub fn has_positive_window(&self) -> bool {
        self.start_time < self.end_time
    }
}

#[derive(Debug, Clone)]
pub struct NewAvailability {
    pub provider_id: Uuid,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: i32, start: &str, end: &str) -> CreateAvailabilityRequest {
        CreateAvailabilityRequest {
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_available: None,
        }
    }

    #[test]
    fn test_valid_window() {
        let req = slot(1, "08:00", "17:30");
        assert!(req.validate().is_ok());
        assert!(req.has_positive_window());
    }

    #[test]
    fn test_rejects_bad_times_and_days() {
        assert!(slot(7, "08:00", "09:00").validate().is_err());
        assert!(slot(1, "8:00", "09:00").validate().is_err());
        assert!(slot(1, "08:00", "24:00").validate().is_err());
        assert!(!slot(1, "10:00", "09:00").has_positive_window());
        assert!(!slot(1, "10:00", "10:00").has_positive_window());
    }
}
