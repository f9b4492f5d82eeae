use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{Message, SendMessageRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/messages",
    tag = "messages",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent to the other participant", body = Message),
        (status = 400, description = "Empty message"),
        (status = 403, description = "Caller is not a participant")
    ),
    security(("session_cookie" = []))
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = state.messages.send(&caller, booking_id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}/messages",
    tag = "messages",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Conversation, oldest first", body = [Message]),
        (status = 403, description = "Caller is not a participant")
    ),
    security(("session_cookie" = []))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.messages.list(&caller, booking_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/messages/{id}/read",
    tag = "messages",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked read", body = Message),
        (status = 403, description = "Caller is not the receiver")
    ),
    security(("session_cookie" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>> {
    Ok(Json(state.messages.mark_read(&caller, id).await?))
}
