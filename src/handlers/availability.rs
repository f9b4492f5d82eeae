use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{Availability, CreateAvailabilityRequest};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/providers/{id}/availability",
    tag = "availability",
    params(("id" = Uuid, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Weekly windows by day and start time", body = [Availability]),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn list_availability(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<Availability>>> {
    Ok(Json(state.availability.list(provider_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/providers/{id}/availability",
    tag = "availability",
    params(("id" = Uuid, Path, description = "Provider profile id")),
    request_body = CreateAvailabilityRequest,
    responses(
        (status = 201, description = "Window added", body = Availability),
        (status = 400, description = "Bad day or time range"),
        (status = 403, description = "Not the profile owner")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_availability(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(provider_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Availability>)> {
    let slot = state
        .availability
        .create(&caller, provider_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[utoipa::path(
    delete,
    path = "/api/availability/{id}",
    tag = "availability",
    params(("id" = Uuid, Path, description = "Availability id")),
    responses(
        (status = 204, description = "Window removed"),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Window not found")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_availability(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.availability.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
