use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncRead;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored uploads (e.g., "public")
    /// * `base_url` - Public prefix the files are served under (e.g., "/public")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys are flat file names: no separators, no `..`, no leading dot (which would reach
    /// the staging area or other hidden entries).
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains(['/', '\\'])
            || storage_key.starts_with('.')
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key '{}' contains invalid characters",
                storage_key
            )));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn create_new(
        &self,
        storage_key: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    StorageError::AlreadyExists(storage_key.to_string())
                }
                _ => StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                )),
            })?;

        let written = async {
            let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to sync file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            Ok::<_, StorageError>(bytes_copied)
        }
        .await;

        match written {
            Ok(bytes_copied) => {
                tracing::info!(
                    path = %path.display(),
                    key = %storage_key,
                    size_bytes = bytes_copied,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage create successful"
                );
                Ok(bytes_copied)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove partially written file"
                    );
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn locate(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Storage directory {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;

        if !meta.is_dir() {
            return Err(StorageError::BackendError(format!(
                "Storage path {} is not a directory",
                self.base_path.display()
            )));
        }

        if meta.permissions().readonly() {
            return Err(StorageError::BackendError(format!(
                "Storage directory {} is read-only",
                self.base_path.display()
            )));
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn reader(data: &'static [u8]) -> Pin<Box<dyn AsyncRead + Send + Unpin>> {
        Box::pin(std::io::Cursor::new(data))
    }

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "/public".to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_create() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let written = storage
            .create_new("readings-1-0-00000000.csv", reader(b"freq,mag\n"))
            .await
            .unwrap();
        assert_eq!(written, 9);

        let stored = std::fs::read(dir.path().join("readings-1-0-00000000.csv")).unwrap();
        assert_eq!(stored, b"freq,mag\n");
        assert_eq!(
            storage.locate("readings-1-0-00000000.csv"),
            "/public/readings-1-0-00000000.csv"
        );
    }

    #[tokio::test]
    async fn test_create_new_never_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage.create_new("a.csv", reader(b"first")).await.unwrap();
        let result = storage.create_new("a.csv", reader(b"second")).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        assert_eq!(std::fs::read(dir.path().join("a.csv")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.create_new("../../../etc/passwd", reader(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("nested/file.csv").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete(".staging").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.create_new("/etc/passwd", reader(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(storage.delete("nonexistent.txt").await.is_ok());

        storage.create_new("gone.txt", reader(b"x")).await.unwrap();
        assert!(dir.path().join("gone.txt").exists());
        storage.delete("gone.txt").await.unwrap();
        assert!(!dir.path().join("gone.txt").exists());
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        assert!(storage.health_check().await.is_ok());

        let gone = LocalStorage {
            base_path: dir.path().join("missing"),
            base_url: "/public".to_string(),
        };
        assert!(gone.health_check().await.is_err());
    }
}
