//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Storage key already in use: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for fra_core::AppError {
    fn from(err: StorageError) -> Self {
        fra_core::AppError::Storage(err.to_string())
    }
}

/// Storage abstraction trait
///
/// The ingest pipeline only ever creates new objects: an existing key is never overwritten,
/// and objects are never mutated after creation. Deletion is used for rollback only.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a new object under `storage_key` from a reader and return the number of bytes
    /// written. The object is durable when this returns. Fails with
    /// [`StorageError::AlreadyExists`] if the key is taken; a failed write leaves nothing behind.
    async fn create_new(
        &self,
        storage_key: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64>;

    /// Delete a file by its storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Public locator reported to clients for a stored object (e.g. `/public/<key>`).
    fn locate(&self, storage_key: &str) -> String;

    /// Verify the backend is reachable and writable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
