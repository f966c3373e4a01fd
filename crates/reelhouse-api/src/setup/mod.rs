//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a served router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use reelhouse_core::Config;
use reelhouse_processing::TokioProcessRunner;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration, before anything is opened
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let videos = database::setup_record_store(&config).await?;
    let (storage, assets) = storage::setup_storage(&config).await?;
    let runner = Arc::new(TokioProcessRunner::new(config.process_timeout()));

    let state = services::build_state(config.clone(), videos, storage, assets, runner);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
