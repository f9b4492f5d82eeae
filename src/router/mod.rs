//! Router configuration.
//!
//! Public and protected routers are merged under one set of global layers.
//! The session middleware runs for every request so public handlers can see
//! the caller too.

pub mod admin;
pub mod protected;
pub mod public;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::auth::middleware::session_middleware;
use crate::middleware::{add_security_headers, metrics_middleware, request_logger_middleware};
use crate::openapi::ApiDoc;

pub use protected::protected_routes;
pub use public::public_routes;

/// Build the application router.
pub fn build_router(app_state: AppState) -> Router {
    let timeout = Duration::from_secs(app_state.config.request_timeout);
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(request_logger_middleware))
        .layer(from_fn_with_state(app_state.clone(), session_middleware))
        .layer(from_fn(add_security_headers))
        .layer(from_fn(metrics_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                ))
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(app_state)
}

/// Credentialed CORS for the configured origins; permissive when none are set.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
