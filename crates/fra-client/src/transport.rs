//! Network side of an upload attempt.

use crate::client::ApiClient;
use crate::controller::SelectedFile;
use async_trait::async_trait;
use bytes::Bytes;
use fra_core::models::{ApiResponse, UploadManifest};
use fra_core::FileFormat;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CHUNK_SIZE: usize = 64 * 1024;

/// Why a transfer did not produce a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upload cancelled")]
    Cancelled,

    /// The transfer task ended without an outcome (it panicked or was aborted).
    #[error("Upload interrupted")]
    Interrupted,

    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),
}

/// Event produced by a running transfer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransferEvent {
    Progress { sent: u64, total: u64 },
    Completed(UploadManifest),
    Failed(TransferError),
}

/// A transfer event tagged with the attempt that produced it.
#[derive(Debug)]
pub(crate) struct AttemptEvent {
    pub attempt: u64,
    pub event: TransferEvent,
}

/// Handle a transport uses to report bytes sent for the current attempt.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    attempt: u64,
    tx: mpsc::UnboundedSender<AttemptEvent>,
}

impl ProgressReporter {
    pub(crate) fn new(attempt: u64, tx: mpsc::UnboundedSender<AttemptEvent>) -> Self {
        Self { attempt, tx }
    }

    pub fn report(&self, sent: u64, total: u64) {
        // The controller may already be gone; progress is then irrelevant.
        let _ = self.tx.send(AttemptEvent {
            attempt: self.attempt,
            event: TransferEvent::Progress { sent, total },
        });
    }
}

/// Sends one selected file to the ingest endpoint.
#[async_trait]
pub trait UploadTransport: Send + Sync + 'static {
    /// Upload `file`, reporting progress as bytes go out. Implementations should stop promptly
    /// once `cancel` fires; the controller also aborts the task running this future.
    async fn send(
        &self,
        file: SelectedFile,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<UploadManifest, TransferError>;
}

/// Multipart upload over HTTP with reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ApiClient,
}

impl ReqwestTransport {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(ApiClient::from_env()?))
    }

    fn build_form(file: &SelectedFile, progress: ProgressReporter) -> Result<Form, TransferError> {
        let total = file.size();
        let content = file.content().clone();
        let chunks: Vec<Bytes> = (0..content.len())
            .step_by(CHUNK_SIZE)
            .map(|start| content.slice(start..(start + CHUNK_SIZE).min(content.len())))
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });

        let mime_type = file
            .mime_type()
            .map(str::to_string)
            .or_else(|| {
                FileFormat::from_file_name(file.name()).map(|f| f.canonical_mime_type().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file.name().to_string())
            .mime_str(&mime_type)
            .map_err(|e| TransferError::InvalidResponse(format!("Invalid MIME type: {}", e)))?;

        Ok(Form::new().part(fra_core::constants::UPLOAD_FIELD_NAME, part))
    }

    async fn post(&self, form: Form) -> Result<UploadManifest, TransferError> {
        let response = self
            .client
            .http()
            .post(self.client.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(rejection(status.as_u16(), &body));
        }

        let envelope: ApiResponse<UploadManifest> = serde_json::from_str(&body)
            .map_err(|e| TransferError::InvalidResponse(e.to_string()))?;

        envelope
            .data
            .ok_or_else(|| TransferError::InvalidResponse("Response has no data".to_string()))
    }
}

/// Surface the server's envelope message when there is one.
fn rejection(status: u16, body: &str) -> TransferError {
    match serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        Ok(envelope) => TransferError::Rejected {
            status,
            message: envelope.message,
            code: envelope.code,
        },
        Err(_) => TransferError::Rejected {
            status,
            message: if body.trim().is_empty() {
                format!("Upload failed with status {}", status)
            } else {
                body.trim().to_string()
            },
            code: None,
        },
    }
}

#[async_trait]
impl UploadTransport for ReqwestTransport {
    async fn send(
        &self,
        file: SelectedFile,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<UploadManifest, TransferError> {
        let form = Self::build_form(&file, progress)?;

        tracing::debug!(
            file_name = %file.name(),
            size_bytes = file.size(),
            url = %self.client.upload_url(),
            "Starting upload"
        );

        tokio::select! {
            _ = cancel.cancelled() => Err(TransferError::Cancelled),
            result = self.post(form) => result,
        }
    }
}
