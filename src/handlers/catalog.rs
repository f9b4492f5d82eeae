//! Service listing endpoints (`/api/services`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{CreateServiceRequest, ServiceFilter, ServiceListing, UpdateServiceRequest};
use crate::AppState;

/// Active listings, optionally by category or provider
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "services",
    params(ServiceFilter),
    responses((status = 200, description = "Active listings", body = [ServiceListing]))
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<Vec<ServiceListing>>> {
    Ok(Json(state.catalog.list(&filter).await?))
}

/// Every listing of one provider, inactive ones included
#[utoipa::path(
    get,
    path = "/api/services/provider/{providerId}",
    tag = "services",
    params(("providerId" = Uuid, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Provider listings", body = [ServiceListing]),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn provider_services(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<ServiceListing>>> {
    Ok(Json(state.catalog.for_provider(provider_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Listing created", body = ServiceListing),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller has no provider profile")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_service(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceListing>)> {
    let listing = state.catalog.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

#[utoipa::path(
    put,
    path = "/api/services/{id}",
    tag = "services",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated listing", body = ServiceListing),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Service not found")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_service(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateServiceRequest>,
) -> Result<Json<ServiceListing>> {
    Ok(Json(state.catalog.update(&caller, id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    tag = "services",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Service not found"),
        (status = 409, description = "Listing is referenced by bookings")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_service(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.catalog.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
