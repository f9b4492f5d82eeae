use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::booking::validate_amount;
use super::own_provider_profile;
use crate::auth::CurrentUser;
use crate::database::repository::{ProviderRepository, ServiceRepository};
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{
    CreateServiceRequest, NewServiceListing, ServiceFilter, ServiceListing, UpdateServiceRequest,
    DEFAULT_PRICE_UNIT,
};

/// Provider service listings.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>, ApiError> {
        self.store.list_services(filter).await
    }

    pub async fn for_provider(&self, provider_id: Uuid) -> Result<Vec<ServiceListing>, ApiError> {
        if self.store.find_provider(provider_id).await?.is_none() {
            return Err(ApiError::not_found("Provider"));
        }
        self.store.services_for_provider(provider_id).await
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateServiceRequest,
    ) -> Result<ServiceListing, ApiError> {
        request.validate()?;
        let price = validate_amount("price", request.price)?;
        let profile = own_provider_profile(self.store.as_ref(), caller.id).await?;

        let listing = self
            .store
            .create_service(NewServiceListing {
                provider_id: profile.id,
                category: request.category,
                name: request.name.trim().to_string(),
                description: request.description,
                price,
                price_unit: request
                    .price_unit
                    .unwrap_or_else(|| DEFAULT_PRICE_UNIT.to_string()),
                is_active: request.is_active.unwrap_or(true),
            })
            .await?;
        info!(service_id = %listing.id, provider_id = %profile.id, "Service listed");
        Ok(listing)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        mut request: UpdateServiceRequest,
    ) -> Result<ServiceListing, ApiError> {
        request.validate()?;
        request.price = request
            .price
            .map(|p| validate_amount("price", p))
            .transpose()?;
        self.owned(caller, id).await?;

        self.store
            .update_service(id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Service"))
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> Result<(), ApiError> {
        self.owned(caller, id).await?;
        if !self.store.delete_service(id).await? {
            return Err(ApiError::not_found("Service"));
        }
        info!(service_id = %id, "Service deleted");
        Ok(())
    }

    async fn owned(&self, caller: &CurrentUser, id: Uuid) -> Result<ServiceListing, ApiError> {
        let listing = self
            .store
            .find_service(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Service"))?;
        let profile = own_provider_profile(self.store.as_ref(), caller.id).await?;
        if listing.provider_id != profile.id {
            return Err(ApiError::access_denied("service"));
        }
        Ok(listing)
    }
}
