//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a running router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use portal_core::Config;
use portal_db::{PgSubmissionRepository, SubmissionRepository};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    portal_infra::init_telemetry(&config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let repository: Arc<dyn SubmissionRepository> = Arc::new(PgSubmissionRepository::new(pool));

    let storage = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, repository, storage)?;

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
