//! Domain models for the ingest pipeline.

pub mod response;
pub mod stored_file;

pub use response::{ApiResponse, FieldError};
pub use stored_file::{StoredFile, StoredFileSummary, UploadManifest};
