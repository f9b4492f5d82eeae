//! Registration, login, logout and the current-user endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::handlers::extractors::ApiJson;
use crate::models::{LoginRequest, RegisterRequest, UpdateUserRequest, User};
use crate::AppState;

/// Create an account and sign it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; session cookie set", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin role requested"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let user = state.auth.register(request).await?;
    let cookie = state.sessions.start(user.id).await?;
    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = User),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response> {
    let user = state.auth.login(request).await?;
    let cookie = state.sessions.start(user.id).await?;
    Ok(([(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/api/auth/user",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Authentication required")
    ),
    security(("session_cookie" = []))
)]
pub async fn current_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<User>> {
    Ok(Json(state.auth.current(caller.id).await?))
}

/// Update the signed-in user's own profile
#[utoipa::path(
    put,
    path = "/api/auth/user",
    tag = "auth",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_current_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    Ok(Json(state.auth.update_profile(caller.id, request).await?))
}

/// Redirect-based entry point to the login page
#[utoipa::path(
    get,
    path = "/api/login",
    tag = "auth",
    responses((status = 302, description = "Redirect to the login page"))
)]
pub async fn login_redirect(State(state): State<AppState>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.config.session.login_page_url.clone())],
    )
        .into_response()
}

/// End the session and go back to the landing page
#[utoipa::path(
    get,
    path = "/api/logout",
    tag = "auth",
    responses((status = 302, description = "Session ended; redirect to /"))
)]
pub async fn logout_redirect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let cookie = state.sessions.end(&headers).await?;
    Ok((
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, cookie),
            (header::LOCATION, HeaderValue::from_static("/")),
        ],
    )
        .into_response())
}

/// End the session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Session ended"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let cookie = state.sessions.end(&headers).await?;
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}
