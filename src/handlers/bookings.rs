use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{Booking, CreateBookingRequest, UpdateBookingRequest};
use crate::AppState;

/// Book a provider's service as the signed-in client
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in pending state", body = Booking),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Provider or service not found"),
        (status = 409, description = "Scheduled slot already taken")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = state.bookings.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings the caller made as a client
#[utoipa::path(
    get,
    path = "/api/bookings/client",
    tag = "bookings",
    responses(
        (status = 200, description = "Client bookings in creation order", body = [Booking]),
        (status = 401, description = "Authentication required")
    ),
    security(("session_cookie" = []))
)]
pub async fn client_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.for_client(&caller).await?))
}

/// Bookings received by the caller's provider profile
#[utoipa::path(
    get,
    path = "/api/bookings/provider",
    tag = "bookings",
    responses(
        (status = 200, description = "Provider bookings in creation order", body = [Booking]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller has no provider profile")
    ),
    security(("session_cookie" = []))
)]
pub async fn provider_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.for_provider(&caller).await?))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "bookings",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Booking not found")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(state.bookings.get(&caller, id).await?))
}

/// Partial update; status changes follow the booking lifecycle
#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    tag = "bookings",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Updated booking", body = Booking),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed or booking changed concurrently")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_booking(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateBookingRequest>,
) -> Result<Json<Booking>> {
    Ok(Json(state.bookings.update(&caller, id, request).await?))
}
