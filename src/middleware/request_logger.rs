use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::constants::headers::REQUEST_ID;

/// Tags each request with an `x-request-id` (reusing the caller's) and logs
/// the outcome once the handler has run.
pub async fn request_logger_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request.extensions().get::<CurrentUser>().map(|u| u.id);
    let start = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    let user = user_id.map(|id| id.to_string()).unwrap_or_default();

    if status.is_server_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration_ms,
            user_id = %user,
            "Request failed"
        );
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            user_id = %user,
            "Request denied"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration_ms,
            user_id = %user,
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}
