//! Storage setup, connect/retry, and teardown

use anyhow::{Context, Result};
use fra_core::Config;
use fra_storage::{create_storage, StagingArea, Storage};
use std::sync::Arc;

/// Create the configured storage backend and wait until it answers its health check.
///
/// Gives up after `STORAGE_CONNECT_RETRIES` attempts spaced `STORAGE_CONNECT_RETRY_DELAY_MS`
/// apart.
pub async fn connect_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let attempts = config.storage_connect_retries().max(1);
    let delay = config.storage_connect_retry_delay();

    let mut last_error = None;
    for attempt in 1..=attempts {
        let result = async {
            let storage = create_storage(config).await?;
            storage.health_check().await?;
            Ok::<_, fra_storage::StorageError>(storage)
        }
        .await;

        match result {
            Ok(storage) => {
                tracing::info!(
                    backend = %storage.backend_type(),
                    attempt,
                    "Storage connected"
                );
                return Ok(storage);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = attempts,
                    "Storage connection failed"
                );
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to connect to storage after {} attempts: {}",
        attempts,
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string())
    ))
}

/// Create the staging area and clear out anything a previous process left behind.
pub async fn setup_staging(config: &Config) -> Result<StagingArea> {
    let staging = StagingArea::new(config.staging_path())
        .await
        .context("Failed to create staging area")?;

    let removed = staging
        .purge()
        .await
        .context("Failed to purge staging area")?;
    if removed > 0 {
        tracing::warn!(removed, "Removed stale staged uploads from a previous run");
    }

    Ok(staging)
}

/// Release storage resources on shutdown: anything still staged is discarded.
pub async fn teardown(staging: &StagingArea) {
    match staging.purge().await {
        Ok(removed) => tracing::info!(removed, "Staging area purged"),
        Err(e) => tracing::error!(error = %e, "Failed to purge staging area on shutdown"),
    }
}
