//! Staging area for in-flight uploads.
//!
//! Each incoming file is streamed into a private temporary file under the staging directory
//! and only committed to [`Storage`](crate::Storage) once the whole request has validated.
//! A staged file is removed when its [`StagedFile`] is dropped, so every early return on the
//! ingest path discards what it wrote.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::traits::{StorageError, StorageResult};

const STAGED_PREFIX: &str = "upload-";

/// Directory holding staged uploads.
#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub async fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Open a new, empty staged file.
    pub async fn stage(&self) -> StorageResult<StagedFile> {
        let temp = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create staged file in {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;

        let writer = fs::File::from_std(temp.reopen()?);

        Ok(StagedFile {
            temp,
            writer,
            len: 0,
        })
    }

    /// Remove every staged file left behind, e.g. by a crashed process. Returns how many
    /// files were removed.
    pub async fn purge(&self) -> StorageResult<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_staged = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(STAGED_PREFIX));

            if is_staged && entry.file_type().await?.is_file() {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                staging_dir = %self.dir.display(),
                removed,
                "Purged staged uploads"
            );
        }

        Ok(removed)
    }
}

/// One upload being written to the staging area.
pub struct StagedFile {
    temp: NamedTempFile,
    writer: fs::File,
    len: u64,
}

impl StagedFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.writer.write_all(chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write staged file {}: {}",
                self.temp.path().display(),
                e
            ))
        })?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered writes; call once the part has been fully received.
    pub async fn finish(&mut self) -> StorageResult<()> {
        self.writer.flush().await?;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Reader over the staged bytes, for committing into storage.
    pub async fn reader(&self) -> StorageResult<Pin<Box<dyn AsyncRead + Send + Unpin>>> {
        let file = fs::File::open(self.temp.path()).await?;
        Ok(Box::pin(file))
    }
}
