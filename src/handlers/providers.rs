use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{
    CreateProviderRequest, ProviderFilter, ProviderProfile, ProviderWithDetails,
    UpdateProviderRequest, VerificationRequest,
};
use crate::AppState;

/// Browse providers with their user record and services
#[utoipa::path(
    get,
    path = "/api/providers",
    tag = "providers",
    params(ProviderFilter),
    responses((status = 200, description = "Matching providers", body = [ProviderWithDetails]))
)]
pub async fn list_providers(
    State(state): State<AppState>,
    Query(filter): Query<ProviderFilter>,
) -> Result<Json<Vec<ProviderWithDetails>>> {
    Ok(Json(state.providers.list(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/providers/{id}",
    tag = "providers",
    params(("id" = Uuid, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Provider", body = ProviderWithDetails),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderWithDetails>> {
    Ok(Json(state.providers.get(id).await?))
}

/// Open a provider profile for the signed-in user
#[utoipa::path(
    post,
    path = "/api/providers",
    tag = "providers",
    request_body = CreateProviderRequest,
    responses(
        (status = 201, description = "Profile created", body = ProviderProfile),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Caller already has a profile")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_provider(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateProviderRequest>,
) -> Result<(StatusCode, Json<ProviderProfile>)> {
    let profile = state.providers.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Owner edits; aggregate and verification fields are rejected
#[utoipa::path(
    put,
    path = "/api/providers/{id}",
    tag = "providers",
    params(("id" = Uuid, Path, description = "Provider profile id")),
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProviderProfile),
        (status = 400, description = "Unknown or read-only field"),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Provider not found")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_provider(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateProviderRequest>,
) -> Result<Json<ProviderProfile>> {
    Ok(Json(state.providers.update(&caller, id, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/providers/{id}/verification",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Provider profile id")),
    request_body = VerificationRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProviderProfile),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Provider not found")
    ),
    security(("session_cookie" = []))
)]
pub async fn set_verification(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<VerificationRequest>,
) -> Result<Json<ProviderProfile>> {
    Ok(Json(
        state.providers.set_verification(&admin, id, request).await?,
    ))
}
