//! Application startup: store selection, metrics recorder and background tasks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::auth::SessionManager;
use crate::config::Config;
use crate::constants::auth::SESSION_PURGE_INTERVAL_SECS;
use crate::database::repository::StoreHealth;
use crate::database::{self, MemoryStore, PgStore, Store};

/// Builds the `AppState` for the server binary.
pub async fn initialize_app(config: Config) -> Result<AppState> {
    info!("🚀 Starting ServiceHub API ({})", config.environment);

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    info!("✅ Prometheus metrics initialized");

    let store = setup_store(&config).await?;
    info!(backend = store.backend(), "✅ Store ready");

    let state = AppState::new(store, config, Some(metrics_handle));
    spawn_session_reaper(state.sessions.clone(), Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));

    Ok(state)
}

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
pub async fn setup_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = database::setup_database(url, config.max_connections).await?;
            database::run_migrations(&pool).await?;
            info!("✅ Database migrations completed");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None if config.is_production() => {
            anyhow::bail!("DATABASE_URL is required in production")
        }
        None => {
            warn!("⚠️ DATABASE_URL not set; data is kept in memory and lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Periodically deletes expired session rows.
pub fn spawn_session_reaper(sessions: SessionManager, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Expired sessions removed"),
                Err(e) => error!(error = %e, "Session purge failed"),
            }
        }
    })
}

