//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub record_store: String,
    pub storage: String,
}

/// Probe the record store and object store with a cheap read each.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let record_store = match tokio::time::timeout(CHECK_TIMEOUT, state.videos.get(Uuid::nil())).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    };

    let storage = match tokio::time::timeout(CHECK_TIMEOUT, state.storage.exists(".health")).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    };

    let healthy = record_store == "healthy" && storage == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(record_store = %record_store, storage = %storage, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            record_store,
            storage,
        }),
    )
}
