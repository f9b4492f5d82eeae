use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::CurrentUser;
use crate::database::repository::UserRepository;
use crate::error::ApiError;
use crate::AppState;

/// Resolves the session cookie into a [`CurrentUser`] request extension.
///
/// Anonymous requests pass through untouched; gating is left to
/// [`require_session`] so public routes can still see who is calling.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let record = match state.sessions.resolve(request.headers()).await {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Session lookup failed");
            return e.into_response();
        }
    };

    if let Some(record) = record {
        match state.store.find_user(record.user_id).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser::from(&user));
            }
            Ok(None) => {
                debug!(user_id = %record.user_id, "Session points at a deleted user");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}

/// Rejects anonymous callers with 401 before the handler (and its body
/// extractor) runs.
pub async fn require_session(request: Request<Body>, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        metrics::counter!("unauthenticated_requests_total").increment(1);
        return ApiError::unauthenticated().into_response();
    }
    next.run(request).await
}

/// Admin-only routes.
pub async fn require_admin(user: AuthenticatedUser, request: Request<Body>, next: Next) -> Response {
    if user.0.is_admin() {
        next.run(request).await
    } else {
        ApiError::Forbidden("Admin access required".to_string()).into_response()
    }
}

/// Extractor for the signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}
