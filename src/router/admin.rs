//! Admin-only routes, nested under `/api/admin`.

use axum::{middleware::from_fn, routing::put, Router};

use crate::app_state::AppState;
use crate::auth::middleware::require_admin;
use crate::handlers::providers;

/// Build admin-only routes. Non-admins get 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/providers/{id}/verification",
            put(providers::set_verification),
        )
        .route_layer(from_fn(require_admin))
}
