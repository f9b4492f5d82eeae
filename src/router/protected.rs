//! Routes that require a signed-in session.
//!
//! Anonymous requests are turned away with 401 before any handler (or its
//! body extractor) runs.

use axum::{
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::auth::middleware::require_session;
use crate::handlers::{
    auth, availability, bookings, catalog, dashboard, messages, providers, reviews,
};

use super::admin::admin_routes;

/// Build protected routes that require authentication.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/user",
            get(auth::current_user).put(auth::update_current_user),
        )
        .nest("/api/bookings", booking_routes())
        .route("/api/providers", post(providers::create_provider))
        .route("/api/providers/{id}", put(providers::update_provider))
        .route(
            "/api/providers/{id}/availability",
            post(availability::create_availability),
        )
        .route(
            "/api/availability/{id}",
            delete(availability::delete_availability),
        )
        .route("/api/services", post(catalog::create_service))
        .route(
            "/api/services/{id}",
            put(catalog::update_service).delete(catalog::delete_service),
        )
        .route("/api/reviews", post(reviews::create_review))
        .route("/api/messages/{id}/read", put(messages::mark_read))
        .route("/api/dashboard/client", get(dashboard::client_dashboard))
        .route("/api/dashboard/provider", get(dashboard::provider_dashboard))
        .nest("/api/admin", admin_routes())
        .route_layer(from_fn(require_session))
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(bookings::create_booking))
        .route("/client", get(bookings::client_bookings))
        .route("/provider", get(bookings::provider_bookings))
        .route(
            "/{id}",
            get(bookings::get_booking).put(bookings::update_booking),
        )
        .route(
            "/{id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
}
