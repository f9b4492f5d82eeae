use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::PasswordService;
use crate::database::repository::UserRepository;
use crate::database::schema::types::UserRole;
use crate::database::Store;
use crate::error::{ApiError, ErrorCode};
use crate::models::{LoginRequest, NewUser, RegisterRequest, UpdateUserRequest, User};

/// Account registration, credential checks and self-service profile edits.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            bcrypt_cost: crate::auth::password::BCRYPT_COST,
        }
    }

    /// Lower work factor for tests.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;

        let role = match request.role.unwrap_or_default() {
            UserRole::Admin => {
                return Err(ApiError::with_code(
                    ErrorCode::InsufficientPermissions,
                    "The admin role cannot be self-assigned",
                ))
            }
            role => role,
        };

        let password_hash =
            PasswordService::hash_with_cost(&request.password, self.bcrypt_cost).await?;
        let user = self
            .store
            .create_user(NewUser {
                email: request.email.trim().to_lowercase(),
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                location: request.location,
                role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<User, ApiError> {
        request.validate()?;

        let user = self.store.find_user_by_email(request.email.trim()).await?;
        let verified = match user.as_ref().and_then(|u| u.password_hash.as_deref()) {
            Some(hash) => PasswordService::verify_password(&request.password, hash).await?,
            None => false,
        };

        let outcome = if verified { "true" } else { "false" };
        metrics::counter!("auth_attempts_total", "success" => outcome).increment(1);

        match user {
            Some(user) if verified => {
                info!(user_id = %user.id, "User logged in");
                Ok(user)
            }
            _ => {
                warn!("Failed login attempt");
                Err(ApiError::invalid_credentials())
            }
        }
    }

    pub async fn current(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(ApiError::unauthenticated)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        request.validate()?;
        self.store
            .update_user(user_id, &request)
            .await?
            .ok_or_else(ApiError::unauthenticated)
    }
}
