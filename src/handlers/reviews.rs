use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{CreateReviewRequest, Review};
use crate::AppState;

/// Review a completed booking
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created; provider rating recomputed", body = Review),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller is not the booking's client"),
        (status = 409, description = "Booking already reviewed"),
        (status = 422, description = "Booking is not completed")
    ),
    security(("session_cookie" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = state.reviews.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    get,
    path = "/api/reviews/provider/{providerId}",
    tag = "reviews",
    params(("providerId" = Uuid, Path, description = "Provider profile id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = [Review]),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn provider_reviews(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.reviews.for_provider(provider_id).await?))
}
