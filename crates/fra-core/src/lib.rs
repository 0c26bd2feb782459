//! FRA Core Library
//!
//! This crate provides the domain models, error types, configuration, and upload validation
//! shared by the ingest server and the upload client.

pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngestConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use formats::FileFormat;
pub use storage_types::StorageBackend;
pub use validation::{RejectReason, SizeGuard, UploadPolicy, Verdict};
