use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::database::schema::types::ServiceCategory;

pub const DEFAULT_PRICE_UNIT: &str = "per job";

/// A priced offering in a provider's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category: ServiceCategory,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub price_unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServiceListing {
    pub provider_id: Uuid,
    pub category: ServiceCategory,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub price_unit: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub category: ServiceCategory,
    #[validate(length(min = 1, max = 200, message = "Service name is required"))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub price_unit: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateServiceRequest {
    pub category: Option<ServiceCategory>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub price_unit: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceFilter {
    pub category: Option<ServiceCategory>,
    pub provider_id: Option<Uuid>,
}

impl ServiceFilter {
    pub fn matches(&self, service: &ServiceListing) -> bool {
        self.category.map_or(true, |c| service.category == c)
            && self.provider_id.map_or(true, |p| service.provider_id == p)
    }
}
