//! Upload ingest pipeline.
//!
//! Parts of the `content` field are validated by name before any byte is read, streamed into
//! the staging area under a running size check, and committed to storage only once the whole
//! request has been received. Commit is all-or-nothing: if any file fails to commit, the files
//! already committed for the request are deleted again.

use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use fra_core::constants::UPLOAD_FIELD_NAME;
use fra_core::models::StoredFile;
use fra_core::validation::detect_mime_type;
use fra_core::{AppError, FileFormat};
use fra_storage::{generate_storage_key, StagedFile, Storage, StorageError};
use futures::future::join_all;
use tracing::Instrument;

use crate::error::multipart_error;
use crate::state::AppState;

const MAX_KEY_ATTEMPTS: usize = 3;

/// A part that passed validation and is fully written to the staging area.
pub struct ReceivedFile {
    pub original_name: String,
    pub declared_mime_type: Option<String>,
    pub format: FileFormat,
    pub staged: StagedFile,
}

pub struct IngestService<'a> {
    state: &'a AppState,
}

impl<'a> IngestService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Receive, validate and commit every file of one upload request.
    ///
    /// Receiving runs under the configured ingest deadline; on expiry the staged files are
    /// dropped (and with them removed) and nothing is committed.
    pub async fn ingest(&self, multipart: Multipart) -> Result<Vec<StoredFile>, AppError> {
        let upload_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("ingest", upload_id = %upload_id);

        async move {
            let deadline = self.state.config.ingest_timeout();
            let received = match tokio::time::timeout(deadline, self.receive(multipart)).await {
                Ok(received) => received?,
                Err(_) => {
                    return Err(AppError::Timeout(format!(
                        "Upload did not complete within {} seconds",
                        deadline.as_secs()
                    )))
                }
            };

            let stored = commit(self.state.storage.as_ref(), received).await?;

            tracing::info!(
                files_count = stored.len(),
                total_bytes = stored.iter().map(|f| f.byte_size).sum::<u64>(),
                "Upload committed"
            );

            Ok(stored)
        }
        .instrument(span)
        .await
    }

    async fn receive(&self, mut multipart: Multipart) -> Result<Vec<ReceivedFile>, AppError> {
        let policy = &self.state.policy;
        let max_files = self.state.config.max_files_per_request();
        let mut received: Vec<ReceivedFile> = Vec::new();

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or_default().to_string();
            if field_name != UPLOAD_FIELD_NAME {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected field '{}'. Files must be sent in field '{}'.",
                    field_name, UPLOAD_FIELD_NAME
                )));
            }

            if received.len() >= max_files {
                return Err(AppError::TooManyFiles(format!(
                    "Too many files. At most {} files may be uploaded in field '{}'.",
                    max_files, UPLOAD_FIELD_NAME
                )));
            }

            let original_name = field.file_name().unwrap_or_default().to_string();
            let declared_mime_type = field.content_type().map(str::to_string);

            let format = policy
                .classify(&original_name, declared_mime_type.as_deref())
                .into_result()
                .inspect_err(|reason| {
                    tracing::debug!(
                        file_name = %original_name,
                        reason = %reason,
                        "Rejected upload part"
                    );
                })?;

            let mut guard = policy.size_guard();
            let mut staged = self.state.staging.stage().await?;

            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                guard.observe(chunk.len()).inspect_err(|reason| {
                    tracing::debug!(
                        file_name = %original_name,
                        reason = %reason,
                        "Rejected upload part mid-stream"
                    );
                })?;
                staged.write_chunk(&chunk).await?;
            }
            staged.finish().await?;

            tracing::debug!(
                file_name = %original_name,
                size_bytes = staged.len(),
                format = %format,
                "Upload part staged"
            );

            received.push(ReceivedFile {
                original_name,
                declared_mime_type,
                format,
                staged,
            });
        }

        if received.is_empty() {
            return Err(AppError::MissingFiles(
                "No content files uploaded".to_string(),
            ));
        }

        Ok(received)
    }
}

/// Commit staged files concurrently. Every commit runs to completion before the outcome is
/// decided, so a failure never leaves a half-written object behind; on failure the successful
/// commits are rolled back.
pub async fn commit(
    storage: &dyn Storage,
    received: Vec<ReceivedFile>,
) -> Result<Vec<StoredFile>, AppError> {
    let accepted_at = Utc::now();

    let results = join_all(
        received
            .iter()
            .map(|file| commit_one(storage, file, accepted_at)),
    )
    .await;

    let mut stored = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(file) => stored.push(file),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        None => Ok(stored),
        Some(err) => {
            rollback(storage, &stored).await;
            Err(err.into())
        }
    }
}

async fn commit_one(
    storage: &dyn Storage,
    file: &ReceivedFile,
    accepted_at: DateTime<Utc>,
) -> Result<StoredFile, StorageError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let key = generate_storage_key(&file.original_name, accepted_at);

        match storage.create_new(&key, file.staged.reader().await?).await {
            Ok(byte_size) => {
                return Ok(StoredFile {
                    original_name: file.original_name.clone(),
                    path: storage.locate(&key),
                    stored_key: key,
                    byte_size,
                    declared_mime_type: file.declared_mime_type.clone(),
                    mime_type: detect_mime_type(file.format, file.declared_mime_type.as_deref()),
                    format: file.format,
                    accepted_at,
                });
            }
            Err(StorageError::AlreadyExists(taken)) if attempt < MAX_KEY_ATTEMPTS => {
                tracing::warn!(key = %taken, attempt, "Storage key collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn rollback(storage: &dyn Storage, committed: &[StoredFile]) {
    for file in committed {
        match storage.delete(&file.stored_key).await {
            Ok(()) => tracing::info!(
                stored_key = %file.stored_key,
                "Rolled back committed file"
            ),
            Err(e) => tracing::error!(
                error = %e,
                stored_key = %file.stored_key,
                "Failed to roll back committed file"
            ),
        }
    }
}
