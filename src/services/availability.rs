use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::database::repository::{AvailabilityRepository, ProviderRepository};
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{Availability, CreateAvailabilityRequest, NewAvailability, ProviderProfile};

/// Weekly working windows. Overlapping windows are allowed.
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn Store>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, provider_id: Uuid) -> Result<Vec<Availability>, ApiError> {
        self.provider(provider_id).await?;
        self.store.availability_for_provider(provider_id).await
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        provider_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<Availability, ApiError> {
        request.validate()?;
        if !request.has_positive_window() {
            return Err(ApiError::validation_field(
                "endTime",
                "endTime must be after startTime",
            ));
        }

        let provider = self.provider(provider_id).await?;
        if provider.user_id != caller.id {
            return Err(ApiError::access_denied("provider profile"));
        }

        self.store
            .create_availability(NewAvailability {
                provider_id,
                day_of_week: request.day_of_week,
                start_time: request.start_time,
                end_time: request.end_time,
                is_available: request.is_available.unwrap_or(true),
            })
            .await
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> Result<(), ApiError> {
        let slot = self
            .store
            .find_availability(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Availability"))?;
        let provider = self.provider(slot.provider_id).await?;
        if provider.user_id != caller.id {
            return Err(ApiError::access_denied("availability"));
        }
        self.store.delete_availability(id).await?;
        Ok(())
    }

    async fn provider(&self, id: Uuid) -> Result<ProviderProfile, ApiError> {
        self.store
            .find_provider(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))
    }
}
