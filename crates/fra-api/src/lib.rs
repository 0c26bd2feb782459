//! FRA API Library
//!
//! HTTP surface of the upload-and-ingest pipeline: the upload endpoint, health check,
//! error envelope, and application setup.

pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::HttpAppError;
pub use services::analysis::{AnalysisService, LoggingAnalysisService};
pub use state::AppState;
