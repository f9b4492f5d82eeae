//! Application state shared across all handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::database::Store;
use crate::services;

/// Store handle, session manager and one instance of each domain service.
#[derive(Clone)]
pub struct AppState {
    /// Postgres or in-memory persistence
    pub store: Arc<dyn Store>,
    pub sessions: SessionManager,
    pub config: Arc<Config>,
    pub auth: services::AuthService,
    pub bookings: services::BookingService,
    pub providers: services::ProviderService,
    pub catalog: services::CatalogService,
    pub reviews: services::ReviewService,
    pub messages: services::MessageService,
    pub availability: services::AvailabilityService,
    pub dashboard: services::DashboardService,
    /// Absent when no Prometheus recorder was installed (tests)
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config, metrics_handle: Option<PrometheusHandle>) -> Self {
        let sessions = SessionManager::new(store.clone(), &config.session, config.is_production());
        Self {
            sessions,
            auth: services::AuthService::new(store.clone()),
            bookings: services::BookingService::new(store.clone()),
            providers: services::ProviderService::new(store.clone()),
            catalog: services::CatalogService::new(store.clone()),
            reviews: services::ReviewService::new(store.clone()),
            messages: services::MessageService::new(store.clone()),
            availability: services::AvailabilityService::new(store.clone()),
            dashboard: services::DashboardService::new(store.clone()),
            store,
            config: Arc::new(config),
            metrics_handle,
        }
    }

    /// Swaps in a cheaper bcrypt work factor.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.auth = self.auth.with_bcrypt_cost(cost);
        self
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for services::BookingService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.bookings.clone()
    }
}

impl FromRef<AppState> for services::DashboardService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dashboard.clone()
    }
}
