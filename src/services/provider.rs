use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::database::repository::ProviderRepository;
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{
    CreateProviderRequest, NewProviderProfile, ProviderFilter, ProviderProfile,
    ProviderWithDetails, UpdateProviderRequest, VerificationRequest,
};

#[derive(Clone)]
pub struct ProviderService {
    store: Arc<dyn Store>,
}

impl ProviderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &ProviderFilter) -> Result<Vec<ProviderWithDetails>, ApiError> {
        self.store.list_providers(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ProviderWithDetails, ApiError> {
        self.store
            .provider_details(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))
    }

    /// Opens the caller's provider profile; the caller becomes a provider.
    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateProviderRequest,
    ) -> Result<ProviderProfile, ApiError> {
        request.validate()?;
        let profile = self
            .store
            .create_provider(NewProviderProfile {
                user_id: caller.id,
                bio: request.bio,
                verification_documents: request.verification_documents,
                is_online: request.is_online.unwrap_or(false),
            })
            .await?;
        info!(provider_id = %profile.id, user_id = %caller.id, "Provider profile created");
        Ok(profile)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        request: UpdateProviderRequest,
    ) -> Result<ProviderProfile, ApiError> {
        request.validate()?;
        if request.is_empty() {
            return Err(ApiError::BadRequest("No fields to update".to_string()));
        }

        let profile = self
            .store
            .find_provider(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))?;
        if profile.user_id != caller.id {
            return Err(ApiError::access_denied("provider profile"));
        }

        self.store
            .update_provider(id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))
    }

    pub async fn set_verification(
        &self,
        admin: &CurrentUser,
        id: Uuid,
        request: VerificationRequest,
    ) -> Result<ProviderProfile, ApiError> {
        let profile = self
            .store
            .set_verification(id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Provider"))?;
        info!(
            provider_id = %id,
            admin_id = %admin.id,
            status = ?profile.verification_status,
            tier = ?profile.tier,
            "Provider verification updated"
        );
        Ok(profile)
    }
}
