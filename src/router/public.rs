//! Public routes that don't require a session.
//!
//! Includes: health checks, metrics, sign-in/sign-up, and catalog browsing.

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::{
    auth, availability, catalog, health, metrics, providers, reviews,
};

/// Build public routes that don't require authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Health check routes
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::get_prometheus_metrics))
        // Authentication routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/login", get(auth::login_redirect))
        .route("/api/logout", get(auth::logout_redirect))
        // Browsing
        .route("/api/providers", get(providers::list_providers))
        .route("/api/providers/{id}", get(providers::get_provider))
        .route(
            "/api/providers/{id}/availability",
            get(availability::list_availability),
        )
        .route("/api/services", get(catalog::list_services))
        .route(
            "/api/services/provider/{providerId}",
            get(catalog::provider_services),
        )
        .route(
            "/api/reviews/provider/{providerId}",
            get(reviews::provider_reviews),
        )
}
