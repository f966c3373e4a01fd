//! Storage setup

use anyhow::{Context, Result};
use reelhouse_core::Config;
use reelhouse_storage::{create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Returns the object store for processed videos and the public asset root for thumbnails.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Arc<dyn Storage>)> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize object store")?;

    let assets = LocalStorage::new(config.assets_root().clone(), config.assets_base_url())
        .await
        .with_context(|| {
            format!(
                "Failed to prepare asset root {}",
                config.assets_root().display()
            )
        })?;

    tracing::info!(
        backend = %storage.backend_type(),
        assets_root = %config.assets_root().display(),
        assets_base_url = %config.assets_base_url(),
        "Storage initialized successfully"
    );

    Ok((storage, Arc::new(assets)))
}
