//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use fra_core::Config;

/// Validate critical configuration values
///
/// Runs the config's own checks, then warns about settings that are legal but unusual.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!("Production mode detected but ENVIRONMENT/APP_ENV not set");
    }

    if !config.staging_path().starts_with(config.local_storage_path()) {
        tracing::warn!(
            staging_path = %config.staging_path().display(),
            storage_path = %config.local_storage_path().display(),
            "Staging area is outside the storage root; commits may copy across filesystems"
        );
    }

    if config.ingest_timeout().as_secs() > 600 {
        tracing::warn!(
            ingest_timeout_secs = config.ingest_timeout().as_secs(),
            "INGEST_TIMEOUT_SECS is very high - stalled uploads will hold staging space"
        );
    }

    Ok(())
}
