use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::database::schema::types::BookingStatus;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    #[serde(rename = "AUTH_1001")]
    InvalidCredentials,
    #[serde(rename = "AUTH_1004")]
    SessionMissing,

    // Authorization errors (2xxx)
    #[serde(rename = "AUTHZ_2001")]
    InsufficientPermissions,
    #[serde(rename = "AUTHZ_2002")]
    ResourceAccessDenied,
    #[serde(rename = "AUTHZ_2004")]
    ProviderProfileRequired,

    // Validation errors (3xxx)
    #[serde(rename = "VAL_3001")]
    InvalidInput,
    #[serde(rename = "VAL_3003")]
    InvalidFormat,
    #[serde(rename = "VAL_3005")]
    InvalidAmount,
    #[serde(rename = "VAL_3006")]
    InvalidEmail,
    #[serde(rename = "VAL_3008")]
    PasswordTooWeak,

    // Resource errors (4xxx)
    #[serde(rename = "RES_4001")]
    NotFound,
    #[serde(rename = "RES_4002")]
    AlreadyExists,
    #[serde(rename = "RES_4003")]
    Conflict,

    // Business logic errors (5xxx)
    #[serde(rename = "BIZ_5001")]
    InvalidTransition,
    #[serde(rename = "BIZ_5002")]
    SlotUnavailable,
    #[serde(rename = "BIZ_5003")]
    ReviewNotAllowed,

    // Database errors (7xxx)
    #[serde(rename = "DB_7002")]
    QueryFailed,

    // Internal errors (9xxx)
    #[serde(rename = "INT_9999")]
    InternalServerError,
}

impl ErrorCode {
    /// Get numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::InvalidCredentials => 1001,
            ErrorCode::SessionMissing => 1004,

            ErrorCode::InsufficientPermissions => 2001,
            ErrorCode::ResourceAccessDenied => 2002,
            ErrorCode::ProviderProfileRequired => 2004,

            ErrorCode::InvalidInput => 3001,
            ErrorCode::InvalidFormat => 3003,
            ErrorCode::InvalidAmount => 3005,
            ErrorCode::InvalidEmail => 3006,
            ErrorCode::PasswordTooWeak => 3008,

            ErrorCode::NotFound => 4001,
            ErrorCode::AlreadyExists => 4002,
            ErrorCode::Conflict => 4003,

            ErrorCode::InvalidTransition => 5001,
            ErrorCode::SlotUnavailable => 5002,
            ErrorCode::ReviewNotAllowed => 5003,

            ErrorCode::QueryFailed => 7002,

            ErrorCode::InternalServerError => 9999,
        }
    }

    /// Get user-friendly message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::SessionMissing => "Authentication required. Please log in",

            ErrorCode::InsufficientPermissions => {
                "You don't have permission to perform this action"
            }
            ErrorCode::ResourceAccessDenied => "Access to this resource is denied",
            ErrorCode::ProviderProfileRequired => {
                "You need to create a provider profile to perform this action"
            }

            ErrorCode::InvalidInput => "Invalid input provided",
            ErrorCode::InvalidFormat => "Invalid format provided",
            ErrorCode::InvalidAmount => "Invalid amount provided",
            ErrorCode::InvalidEmail => "Invalid email address format",
            ErrorCode::PasswordTooWeak => "Password must be at least 8 characters long",

            ErrorCode::NotFound => "The requested resource was not found",
            ErrorCode::AlreadyExists => "This resource already exists",
            ErrorCode::Conflict => "A conflict occurred with an existing resource",

            ErrorCode::InvalidTransition => "This booking cannot move to the requested status",
            ErrorCode::SlotUnavailable => "The provider is already booked for this time slot",
            ErrorCode::ReviewNotAllowed => "This booking cannot be reviewed",

            ErrorCode::QueryFailed => "Database query failed",

            ErrorCode::InternalServerError => "An internal server error occurred",
        }
    }
}

/// Structured error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub request_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub code_number: u16,
    pub message: String,
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{1}")]
    WithCode(ErrorCode, String),

    #[error("{1}")]
    WithCodeAndDetails(ErrorCode, String, String),

    #[error("Validation failed: {field}")]
    ValidationWithField {
        code: ErrorCode,
        field: String,
        message: String,
    },
}

impl ApiError {
    /// Create error with specific error code
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::WithCode(code, message.into())
    }

    /// Create error with code and additional details
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        ApiError::WithCodeAndDetails(code, message.into(), details.into())
    }

    /// Create validation error for specific field
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationWithField {
            code: ErrorCode::InvalidInput,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Helper: no session attached to the request
    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized(ErrorCode::SessionMissing.message().to_string())
    }

    /// Helper: Invalid credentials
    pub fn invalid_credentials() -> Self {
        ApiError::with_code(ErrorCode::InvalidCredentials, "Invalid email or password")
    }

    /// Helper: Resource not found
    pub fn not_found(resource: &str) -> Self {
        ApiError::with_code(ErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Helper: Resource already exists
    pub fn already_exists(resource: &str) -> Self {
        ApiError::with_code(
            ErrorCode::AlreadyExists,
            format!("{} already exists", resource),
        )
    }

    /// Helper: caller is not a participant/owner
    pub fn access_denied(resource: &str) -> Self {
        ApiError::with_code(
            ErrorCode::ResourceAccessDenied,
            format!("You do not have access to this {}", resource),
        )
    }

    /// Helper: caller has no provider profile
    pub fn provider_profile_required() -> Self {
        ApiError::with_code(
            ErrorCode::ProviderProfileRequired,
            ErrorCode::ProviderProfileRequired.message(),
        )
    }

    /// Helper: scheduled slot already taken
    pub fn slot_unavailable() -> Self {
        ApiError::with_code(
            ErrorCode::SlotUnavailable,
            ErrorCode::SlotUnavailable.message(),
        )
    }

    /// Helper: review rejected for a business reason
    pub fn review_not_allowed(reason: impl Into<String>) -> Self {
        ApiError::with_details(
            ErrorCode::ReviewNotAllowed,
            ErrorCode::ReviewNotAllowed.message(),
            reason,
        )
    }

    /// True when the error tells the caller to log in
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }

    /// Get error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized(_) => ErrorCode::SessionMissing,
            ApiError::Forbidden(_) => ErrorCode::ResourceAccessDenied,
            ApiError::BadRequest(_) => ErrorCode::InvalidInput,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            ApiError::Database(_) => ErrorCode::QueryFailed,
            ApiError::Internal(_) => ErrorCode::InternalServerError,
            ApiError::WithCode(code, _) => *code,
            ApiError::WithCodeAndDetails(code, _, _) => *code,
            ApiError::ValidationWithField { code, .. } => *code,
        }
    }

    /// Get error details
    fn error_details(&self) -> Option<String> {
        match self {
            ApiError::WithCodeAndDetails(_, _, details) => Some(details.clone()),
            ApiError::InvalidTransition { from, .. } if from.is_terminal() => {
                Some(format!("{} is final", from))
            }
            ApiError::InvalidTransition { from, .. } => Some(format!(
                "{} may only move to: {}",
                from,
                from.allowed_transitions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => None,
        }
    }

    /// Get field name for validation errors
    fn error_field(&self) -> Option<String> {
        match self {
            ApiError::ValidationWithField { field, .. } => Some(field.clone()),
            _ => None,
        }
    }

    /// Get status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_)
            | ApiError::WithCode(ErrorCode::InvalidCredentials, _)
            | ApiError::WithCode(ErrorCode::SessionMissing, _) => StatusCode::UNAUTHORIZED,

            ApiError::Forbidden(_)
            | ApiError::WithCode(ErrorCode::InsufficientPermissions, _)
            | ApiError::WithCode(ErrorCode::ResourceAccessDenied, _)
            | ApiError::WithCode(ErrorCode::ProviderProfileRequired, _) => StatusCode::FORBIDDEN,

            ApiError::BadRequest(_)
            | ApiError::ValidationWithField { .. }
            | ApiError::WithCode(ErrorCode::InvalidInput, _)
            | ApiError::WithCode(ErrorCode::InvalidFormat, _)
            | ApiError::WithCode(ErrorCode::InvalidAmount, _)
            | ApiError::WithCode(ErrorCode::InvalidEmail, _)
            | ApiError::WithCode(ErrorCode::PasswordTooWeak, _)
            | ApiError::WithCodeAndDetails(ErrorCode::InvalidInput, _, _)
            | ApiError::WithCodeAndDetails(ErrorCode::InvalidFormat, _, _) => {
                StatusCode::BAD_REQUEST
            }

            ApiError::NotFound(_) | ApiError::WithCode(ErrorCode::NotFound, _) => {
                StatusCode::NOT_FOUND
            }

            ApiError::Conflict(_)
            | ApiError::InvalidTransition { .. }
            | ApiError::WithCode(ErrorCode::Conflict, _)
            | ApiError::WithCode(ErrorCode::AlreadyExists, _)
            | ApiError::WithCode(ErrorCode::SlotUnavailable, _) => StatusCode::CONFLICT,

            ApiError::WithCode(ErrorCode::ReviewNotAllowed, _)
            | ApiError::WithCodeAndDetails(ErrorCode::ReviewNotAllowed, _, _) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            ApiError::Database(_)
            | ApiError::Internal(_)
            | ApiError::WithCode(_, _)
            | ApiError::WithCodeAndDetails(_, _, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log error with appropriate level
    fn log_error(&self, request_id: &str) {
        match self.status_code() {
            status if status.is_server_error() => {
                error!(
                    request_id = %request_id,
                    error = %self,
                    "Server error occurred"
                );
            }
            status if status.is_client_error() => {
                warn!(
                    request_id = %request_id,
                    error = %self,
                    "Client error occurred"
                );
            }
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let status = self.status_code();
        let code = self.error_code();

        self.log_error(&request_id);

        // Persistence failures stay opaque to the caller
        let message = match &self {
            ApiError::WithCode(_, msg) | ApiError::WithCodeAndDetails(_, msg, _) => msg.clone(),
            ApiError::ValidationWithField { message, .. } => message.clone(),
            ApiError::Unauthorized(_) => code.message().to_string(),
            ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::InvalidTransition { .. } => self.to_string(),
            _ => code.message().to_string(),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                code_number: code.code(),
                message,
                details: self.error_details(),
                field: self.error_field(),
            },
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let first_err = errs.first();
                let code = match first_err.map(|e| &*e.code) {
                    Some("email") => ErrorCode::InvalidEmail,
                    Some("password_too_weak") => ErrorCode::PasswordTooWeak,
                    _ => ErrorCode::InvalidInput,
                };
                let message = first_err
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (code, field.to_string(), message)
            });

        match first {
            Some((code, field, message)) => ApiError::ValidationWithField {
                code,
                field,
                message,
            },
            None => ApiError::BadRequest(errors.to_string()),
        }
    }
}

/// Handle Axum JSON rejections and convert to structured API errors
pub fn handle_rejection(err: JsonRejection) -> ApiError {
    match err {
        JsonRejection::JsonDataError(e) => ApiError::with_details(
            ErrorCode::InvalidInput,
            "Invalid input provided",
            e.body_text(),
        ),
        JsonRejection::JsonSyntaxError(_) => {
            ApiError::with_code(ErrorCode::InvalidFormat, "Invalid JSON format")
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::with_code(ErrorCode::InvalidFormat, "JSON content type required")
        }
        JsonRejection::BytesRejection(_) => {
            ApiError::with_code(ErrorCode::InvalidInput, "Invalid request body format")
        }
        _ => ApiError::with_details(
            ErrorCode::InvalidInput,
            "Invalid input provided",
            format!("{:?}", err),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_401() {
        let err = ApiError::unauthenticated();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.is_unauthorized());
        assert_eq!(err.error_code(), ErrorCode::SessionMissing);
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        assert_eq!(
            ApiError::invalid_credentials().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_business_errors_are_conflicts() {
        let transition = ApiError::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::Pending,
        };
        assert_eq!(transition.status_code(), StatusCode::CONFLICT);
        assert_eq!(transition.error_code().code(), 5001);
        assert_eq!(ApiError::slot_unavailable().status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::already_exists("Review").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_review_not_allowed_is_unprocessable() {
        let err = ApiError::review_not_allowed("booking is still pending");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_details().as_deref(), Some("booking is still pending"));
    }

    #[test]
    fn test_transition_details_list_allowed_targets() {
        let err = ApiError::InvalidTransition {
            from: BookingStatus::Pending,
            to: BookingStatus::Completed,
        };
        assert_eq!(
            err.error_details().as_deref(),
            Some("pending may only move to: confirmed, cancelled")
        );

        let terminal = ApiError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending,
        };
        assert_eq!(terminal.error_details().as_deref(), Some("completed is final"));
    }

    #[test]
    fn test_database_error_is_opaque_500() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), ErrorCode::QueryFailed);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidTransition).unwrap();
        assert_eq!(json, "\"BIZ_5001\"");
    }
}
