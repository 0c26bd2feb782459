//! Hand-off of stored files to the analysis step.

use async_trait::async_trait;
use fra_core::models::StoredFile;
use std::sync::Arc;

/// Receives every file an upload request committed.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn submit(&self, file: &StoredFile) -> Result<(), anyhow::Error>;
}

/// Analysis stand-in: records the hand-off and returns.
#[derive(Clone, Debug, Default)]
pub struct LoggingAnalysisService;

#[async_trait]
impl AnalysisService for LoggingAnalysisService {
    async fn submit(&self, file: &StoredFile) -> Result<(), anyhow::Error> {
        tracing::info!(
            stored_key = %file.stored_key,
            original_name = %file.original_name,
            format = %file.format,
            size_bytes = file.byte_size,
            "File queued for analysis"
        );
        Ok(())
    }
}

/// Hand the files off in the background so analysis never delays or fails the upload.
pub fn dispatch(analysis: Arc<dyn AnalysisService>, files: Vec<StoredFile>) {
    tokio::spawn(async move {
        for file in &files {
            if let Err(e) = analysis.submit(file).await {
                tracing::warn!(
                    error = %e,
                    stored_key = %file.stored_key,
                    "Analysis hand-off failed"
                );
            }
        }
    });
}
