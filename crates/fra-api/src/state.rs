//! Application state shared by every handler.

use crate::services::analysis::AnalysisService;
use fra_core::{Config, UploadPolicy};
use fra_storage::{StagingArea, Storage};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub staging: StagingArea,
    pub policy: UploadPolicy,
    pub analysis: Arc<dyn AnalysisService>,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        staging: StagingArea,
        analysis: Arc<dyn AnalysisService>,
    ) -> Self {
        let policy = config.upload_policy();
        Self {
            config,
            storage,
            staging,
            policy,
            analysis,
        }
    }
}
