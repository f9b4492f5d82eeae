use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::service::ServiceListing;
use super::user::User;
use crate::database::schema::types::{ProviderTier, ServiceCategory, VerificationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub verification_status: VerificationStatus,
    pub verification_documents: Option<serde_json::Value>,
    pub tier: ProviderTier,
    pub is_online: bool,
    #[schema(value_type = String)]
    pub rating: Decimal,
    pub review_count: i32,
    pub completed_jobs: i32,
    #[schema(value_type = String)]
    pub total_earnings: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Profile joined with its owning user and service listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderWithDetails {
    #[serde(flatten)]
    pub profile: ProviderProfile,
    pub user: User,
    pub services: Vec<ServiceListing>,
}

#[derive(Debug, Clone)]
pub struct NewProviderProfile {
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub verification_documents: Option<serde_json::Value>,
    pub is_online: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProviderRequest {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub verification_documents: Option<serde_json::Value>,
    pub is_online: Option<bool>,
}

/// Owner-writable profile fields. Aggregates and verification are server-managed,
/// so sending them is a 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProviderRequest {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub is_online: Option<bool>,
    pub verification_documents: Option<serde_json::Value>,
}

impl UpdateProviderRequest {
    pub fn is_empty(&self) -> bool {
        self.bio.is_none() && self.is_online.is_none() && self.verification_documents.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationRequest {
    pub verification_status: VerificationStatus,
    pub tier: Option<ProviderTier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProviderFilter {
    pub category: Option<ServiceCategory>,
    /// Only providers whose verification status is `verified`.
    pub verified: Option<bool>,
    /// Case-insensitive substring of the owner's location.
    pub location: Option<String>,
    pub is_online: Option<bool>,
    pub user_id: Option<Uuid>,
}

impl ProviderFilter {
    pub fn matches(&self, profile: &ProviderProfile, user: &User, services: &[ServiceListing]) -> bool {
        if let Some(user_id) = self.user_id {
            if profile.user_id != user_id {
                return false;
            }
        }
        if let Some(verified) = self.verified {
            if (profile.verification_status == VerificationStatus::Verified) != verified {
                return false;
            }
        }
        if let Some(online) = self.is_online {
            if profile.is_online != online {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref() {
            let needle = location.to_lowercase();
            let found = user
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        if let Some(category) = self.category {
            if !services.iter().any(|s| s.is_active && s.category == category) {
                return false;
            }
        }
        true
    }
}

/// Aggregates recomputed from the bookings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct JobStats {
    pub completed_jobs: i64,
    pub total_earnings: Decimal,
}

/// Aggregates recomputed from the reviews table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingStats {
    pub rating: Decimal,
    pub review_count: i64,
}

impl RatingStats {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        let rating = (Decimal::from(sum) / Decimal::from(ratings.len() as i64))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            rating,
            review_count: ratings.len() as i64,
        }
    }
}
