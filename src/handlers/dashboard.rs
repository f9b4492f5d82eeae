use axum::{extract::State, Json};

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::services::dashboard::{ClientDashboard, ProviderDashboard};
use crate::services::DashboardService;

/// Client bookings bucketed into active, completed and other
#[utoipa::path(
    get,
    path = "/api/dashboard/client",
    tag = "dashboard",
    responses(
        (status = 200, description = "Client dashboard", body = ClientDashboard),
        (status = 401, description = "Authentication required")
    ),
    security(("session_cookie" = []))
)]
pub async fn client_dashboard(
    State(dashboard): State<DashboardService>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<ClientDashboard>> {
    Ok(Json(dashboard.client(&caller).await?))
}

/// Provider stats plus pending and active jobs
#[utoipa::path(
    get,
    path = "/api/dashboard/provider",
    tag = "dashboard",
    responses(
        (status = 200, description = "Provider dashboard", body = ProviderDashboard),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller has no provider profile")
    ),
    security(("session_cookie" = []))
)]
pub async fn provider_dashboard(
    State(dashboard): State<DashboardService>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<ProviderDashboard>> {
    Ok(Json(dashboard.provider(&caller).await?))
}
