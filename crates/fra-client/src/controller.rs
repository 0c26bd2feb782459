//! Upload state machine.
//!
//! ```text
//! Idle --select--> Selected --start_upload--> Uploading --2xx--> Completed
//!                     ^                           |  \--error/cancel--> Failed
//!                     |                           |                       |
//!                     +------------select---------+--- Completed|Failed --+
//!   Failed --start_upload--> Uploading (retry)      Completed|Failed --clear--> Idle
//! ```
//!
//! Each upload attempt has an id. The transfer runs in a spawned task whose only outputs are
//! events tagged with that id; events from an attempt that is no longer current are dropped,
//! so nothing can move the controller after a cancel or a new attempt. Every attempt ends with
//! exactly one terminal event, also when its task panics or is aborted.

use crate::transport::{
    AttemptEvent, ProgressReporter, TransferError, TransferEvent, UploadTransport,
};
use bytes::Bytes;
use fra_core::models::UploadManifest;
use fra_core::{RejectReason, UploadPolicy, Verdict};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Selected,
    Uploading,
    Completed,
    Failed,
}

/// A file picked for upload, with its content in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: Option<String>,
    content: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// User-visible message left by the last transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUploadState {
    pub selected_file: Option<SelectedFile>,
    /// 0..=100, never decreasing while an attempt is in flight.
    pub progress_percent: u8,
    pub phase: UploadPhase,
    pub notice: Option<Notice>,
}

impl Default for ClientUploadState {
    fn default() -> Self {
        Self {
            selected_file: None,
            progress_percent: 0,
            phase: UploadPhase::Idle,
            notice: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("No file selected")]
    NothingSelected,

    #[error("Cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: UploadPhase,
    },

    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error("Cannot read file: {0}")]
    Unreadable(String),
}

/// The running transfer. Dropping it stops the transfer.
struct InFlight {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl InFlight {
    fn abort(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Sends the terminal event of one attempt. If the task is torn down before an outcome is
/// known, the drop sends `Interrupted` instead.
struct AttemptOutcome {
    attempt: u64,
    tx: mpsc::UnboundedSender<AttemptEvent>,
    delivered: bool,
}

impl AttemptOutcome {
    fn new(attempt: u64, tx: mpsc::UnboundedSender<AttemptEvent>) -> Self {
        Self {
            attempt,
            tx,
            delivered: false,
        }
    }

    fn deliver(mut self, event: TransferEvent) {
        self.send(event);
    }

    fn send(&mut self, event: TransferEvent) {
        self.delivered = true;
        let _ = self.tx.send(AttemptEvent {
            attempt: self.attempt,
            event,
        });
    }
}

impl Drop for AttemptOutcome {
    fn drop(&mut self) {
        if !self.delivered {
            self.send(TransferEvent::Failed(TransferError::Interrupted));
        }
    }
}

type CompletionCallback = Box<dyn FnMut(&UploadManifest) + Send>;

/// Drives one file through selection, upload, and its outcome.
pub struct UploadController<T: UploadTransport> {
    transport: Arc<T>,
    policy: UploadPolicy,
    state: ClientUploadState,
    attempt: u64,
    events_tx: mpsc::UnboundedSender<AttemptEvent>,
    events_rx: mpsc::UnboundedReceiver<AttemptEvent>,
    in_flight: Option<InFlight>,
    on_complete: Option<CompletionCallback>,
}

impl<T: UploadTransport> UploadController<T> {
    pub fn new(transport: T, policy: UploadPolicy) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport: Arc::new(transport),
            policy,
            state: ClientUploadState::default(),
            attempt: 0,
            events_tx,
            events_rx,
            in_flight: None,
            on_complete: None,
        }
    }

    /// Register the consumer of the server's manifest (e.g. the chart view).
    pub fn on_complete(&mut self, callback: impl FnMut(&UploadManifest) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn state(&self) -> &ClientUploadState {
        &self.state
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.phase
    }

    pub fn progress(&self) -> u8 {
        self.state.progress_percent
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.state.notice.as_ref()
    }

    /// Pick a file. A file the policy rejects leaves the controller `Idle` with a warning;
    /// nothing touches the network either way.
    pub fn select(&mut self, file: SelectedFile) -> Result<(), ControllerError> {
        if self.state.phase == UploadPhase::Uploading {
            return Err(ControllerError::UploadInProgress);
        }

        match self
            .policy
            .check_selection(file.name(), file.mime_type(), file.size())
        {
            Verdict::Accept(format) => {
                tracing::debug!(
                    file_name = %file.name(),
                    size_bytes = file.size(),
                    format = %format,
                    "File selected"
                );
                self.state = ClientUploadState {
                    selected_file: Some(file),
                    progress_percent: 0,
                    phase: UploadPhase::Selected,
                    notice: None,
                };
                Ok(())
            }
            Verdict::Reject(reason) => Err(self.reject(file.name(), reason)),
        }
    }

    /// Pick a file from disk. Name and size are checked against the policy before the
    /// content is read.
    pub async fn select_path(&mut self, path: impl AsRef<Path>) -> Result<(), ControllerError> {
        if self.state.phase == UploadPhase::Uploading {
            return Err(ControllerError::UploadInProgress);
        }

        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ControllerError::Unreadable(format!("{}: {}", path.display(), e)))?;
        if let Verdict::Reject(reason) = self.policy.check(&name, None, metadata.len()) {
            return Err(self.reject(&name, reason));
        }

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ControllerError::Unreadable(format!("{}: {}", path.display(), e)))?;
        self.select(SelectedFile::new(name, None, content))
    }

    fn reject(&mut self, file_name: &str, reason: RejectReason) -> ControllerError {
        tracing::debug!(file_name = %file_name, reason = %reason, "File not selectable");
        self.state = ClientUploadState {
            notice: Some(Notice::new(NoticeLevel::Warning, reason.to_string())),
            ..ClientUploadState::default()
        };
        ControllerError::Rejected(reason)
    }

    /// Start uploading the selected file. Also retries after a failure.
    pub fn start_upload(&mut self) -> Result<(), ControllerError> {
        match self.state.phase {
            UploadPhase::Selected | UploadPhase::Failed => {}
            UploadPhase::Uploading => return Err(ControllerError::UploadInProgress),
            UploadPhase::Idle => return Err(ControllerError::NothingSelected),
            phase => {
                return Err(ControllerError::InvalidTransition {
                    action: "start upload",
                    phase,
                })
            }
        }

        let file = self
            .state
            .selected_file
            .clone()
            .ok_or(ControllerError::NothingSelected)?;

        self.attempt += 1;
        let attempt = self.attempt;
        let cancel = CancellationToken::new();
        let reporter = ProgressReporter::new(attempt, self.events_tx.clone());
        let transport = self.transport.clone();
        let events_tx = self.events_tx.clone();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = AttemptOutcome::new(attempt, events_tx);
            let result = tokio::select! {
                _ = task_cancel.cancelled() => Err(TransferError::Cancelled),
                result = transport.send(file, reporter, task_cancel.clone()) => result,
            };
            outcome.deliver(match result {
                Ok(manifest) => TransferEvent::Completed(manifest),
                Err(e) => TransferEvent::Failed(e),
            });
        });

        // Replacing an old guard aborts whatever it still held.
        self.in_flight = Some(InFlight { cancel, handle });
        self.state.phase = UploadPhase::Uploading;
        self.state.progress_percent = 0;
        self.state.notice = None;

        tracing::debug!(attempt, "Upload started");
        Ok(())
    }

    /// Abort the running upload; the controller lands in `Failed` with progress reset.
    pub fn cancel(&mut self) -> Result<(), ControllerError> {
        if self.state.phase != UploadPhase::Uploading {
            return Err(ControllerError::InvalidTransition {
                action: "cancel",
                phase: self.state.phase,
            });
        }

        self.in_flight = None;
        self.fail("Upload cancelled");
        tracing::debug!(attempt = self.attempt, "Upload cancelled");
        Ok(())
    }

    /// Back to `Idle` from `Completed` or `Failed`.
    pub fn clear(&mut self) -> Result<(), ControllerError> {
        match self.state.phase {
            UploadPhase::Completed | UploadPhase::Failed => {
                self.in_flight = None;
                self.state = ClientUploadState::default();
                Ok(())
            }
            phase => Err(ControllerError::InvalidTransition {
                action: "clear",
                phase,
            }),
        }
    }

    /// Wait for the next event of the current attempt and apply it. Returns the phase
    /// afterwards, or `None` when no upload is in flight.
    pub async fn next_event(&mut self) -> Option<UploadPhase> {
        while self.state.phase == UploadPhase::Uploading {
            let event = self.events_rx.recv().await?;
            if self.apply(event) {
                return Some(self.state.phase);
            }
        }
        None
    }

    /// Apply events until the current attempt reaches a terminal phase.
    pub async fn run_to_completion(&mut self) -> UploadPhase {
        while self.next_event().await.is_some() {}
        self.state.phase
    }

    /// Apply every event already queued without waiting. Returns how many were applied.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Returns whether the event belonged to the current attempt and was applied.
    fn apply(&mut self, event: AttemptEvent) -> bool {
        if event.attempt != self.attempt || self.state.phase != UploadPhase::Uploading {
            tracing::trace!(
                event_attempt = event.attempt,
                current_attempt = self.attempt,
                "Dropping stale upload event"
            );
            return false;
        }

        match event.event {
            TransferEvent::Progress { sent, total } => {
                let percent = if total == 0 {
                    100
                } else {
                    (sent.min(total) * 100 / total) as u8
                };
                self.state.progress_percent = self.state.progress_percent.max(percent);
            }
            TransferEvent::Completed(manifest) => {
                self.in_flight = None;
                self.state.phase = UploadPhase::Completed;
                self.state.progress_percent = 100;
                self.state.notice = Some(Notice::new(
                    NoticeLevel::Success,
                    "File uploaded successfully",
                ));
                tracing::debug!(
                    attempt = self.attempt,
                    files_count = manifest.files_count,
                    "Upload completed"
                );
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(&manifest);
                }
            }
            TransferEvent::Failed(error) => {
                self.in_flight = None;
                tracing::debug!(attempt = self.attempt, error = %error, "Upload failed");
                self.fail(error.to_string());
            }
        }
        true
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.state.phase = UploadPhase::Failed;
        self.state.progress_percent = 0;
        self.state.notice = Some(Notice::new(NoticeLevel::Error, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fra_core::models::StoredFileSummary;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn manifest(name: &str) -> UploadManifest {
        UploadManifest {
            files_count: 1,
            files: vec![StoredFileSummary {
                original_name: name.to_string(),
                filename: format!("{}-1-0-00000000.csv", name.trim_end_matches(".csv")),
                path: "/public/x.csv".to_string(),
                size: 4,
                mimetype: "text/csv".to_string(),
            }],
        }
    }

    /// Scripted transport: reports the given progress, then waits for `release` before
    /// returning `outcome`. Ignores cancellation on purpose.
    struct FakeTransport {
        progress: Vec<(u64, u64)>,
        outcome: Result<UploadManifest, TransferError>,
        release: Arc<Notify>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeTransport {
        fn new(progress: Vec<(u64, u64)>, outcome: Result<UploadManifest, TransferError>) -> Self {
            Self {
                progress,
                outcome,
                release: Arc::new(Notify::new()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl UploadTransport for FakeTransport {
        async fn send(
            &self,
            _file: SelectedFile,
            progress: ProgressReporter,
            _cancel: CancellationToken,
        ) -> Result<UploadManifest, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (sent, total) in &self.progress {
                progress.report(*sent, *total);
            }
            self.release.notified().await;
            self.outcome.clone()
        }
    }

    fn csv() -> SelectedFile {
        SelectedFile::new("readings.csv", Some("text/csv".to_string()), b"20,1".to_vec())
    }

    #[tokio::test]
    async fn disallowed_file_stays_idle_without_network() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let calls = transport.calls.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        let err = controller
            .select(SelectedFile::new("photo.png", Some("image/png".to_string()), b"x".to_vec()))
            .unwrap_err();
        assert!(matches!(err, ControllerError::Rejected(_)));
        assert_eq!(controller.phase(), UploadPhase::Idle);
        assert!(controller.state().selected_file.is_none());
        assert_eq!(
            controller.notice().map(|n| n.level),
            Some(NoticeLevel::Warning)
        );

        assert_eq!(controller.start_upload(), Err(ControllerError::NothingSelected));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mismatched_mime_and_oversized_files_are_rejected() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        assert!(controller
            .select(SelectedFile::new("readings.csv", Some("image/png".to_string()), b"x".to_vec()))
            .is_err());

        let big = vec![0u8; 10 * 1024 * 1024 + 1];
        let err = controller
            .select(SelectedFile::new("readings.csv", None, big))
            .unwrap_err();
        assert_eq!(err.to_string(), "File exceeds maximum size of 10MB.");
        assert_eq!(controller.phase(), UploadPhase::Idle);
    }

    #[tokio::test]
    async fn successful_upload_completes_and_notifies() {
        let transport = FakeTransport::new(
            vec![(50, 100), (30, 100), (80, 100)],
            Ok(manifest("readings.csv")),
        );
        let release = transport.release.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        controller.on_complete(move |m| sink.lock().unwrap().push(m.clone()));

        controller.select(csv()).unwrap();
        assert_eq!(controller.phase(), UploadPhase::Selected);
        controller.start_upload().unwrap();
        assert_eq!(controller.phase(), UploadPhase::Uploading);

        let mut seen = Vec::new();
        for _ in 0..3 {
            assert_eq!(controller.next_event().await, Some(UploadPhase::Uploading));
            seen.push(controller.progress());
        }
        assert_eq!(seen, vec![50, 50, 80]);

        release.notify_one();
        assert_eq!(controller.run_to_completion().await, UploadPhase::Completed);
        assert_eq!(controller.progress(), 100);
        assert_eq!(
            controller.notice().map(|n| n.level),
            Some(NoticeLevel::Success)
        );
        assert_eq!(received.lock().unwrap().as_slice(), &[manifest("readings.csv")]);
    }

    #[tokio::test]
    async fn cancel_fails_the_attempt_and_ignores_late_results() {
        let transport = FakeTransport::new(vec![(40, 100)], Ok(manifest("readings.csv")));
        let release = transport.release.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        controller.on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();
        controller.next_event().await;
        assert_eq!(controller.progress(), 40);

        controller.cancel().unwrap();
        assert_eq!(controller.phase(), UploadPhase::Failed);
        assert_eq!(controller.progress(), 0);
        assert_eq!(
            controller.notice().map(|n| n.message.as_str()),
            Some("Upload cancelled")
        );

        release.notify_one();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        controller.poll_events();

        assert_eq!(controller.phase(), UploadPhase::Failed);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert_eq!(controller.next_event().await, None);
    }

    #[tokio::test]
    async fn events_from_superseded_attempt_are_dropped() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();
        controller.cancel().unwrap();
        controller.start_upload().unwrap();
        assert_eq!(controller.attempt, 2);

        let stale = AttemptEvent {
            attempt: 1,
            event: TransferEvent::Completed(manifest("readings.csv")),
        };
        assert!(!controller.apply(stale));
        assert_eq!(controller.phase(), UploadPhase::Uploading);

        let stale_progress = AttemptEvent {
            attempt: 1,
            event: TransferEvent::Progress { sent: 90, total: 100 },
        };
        assert!(!controller.apply(stale_progress));
        assert_eq!(controller.progress(), 0);
    }

    #[tokio::test]
    async fn server_rejection_fails_and_can_be_retried() {
        let transport = FakeTransport::new(
            vec![(100, 100)],
            Err(TransferError::Rejected {
                status: 400,
                message: "Invalid file type. Only csv, txt, xlsx, xml files are allowed."
                    .to_string(),
                code: Some("UNSUPPORTED_FILE_TYPE".to_string()),
            }),
        );
        let release = transport.release.clone();
        let calls = transport.calls.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();
        release.notify_one();
        assert_eq!(controller.run_to_completion().await, UploadPhase::Failed);
        assert_eq!(controller.progress(), 0);
        assert_eq!(
            controller.notice().map(|n| n.message.as_str()),
            Some("Invalid file type. Only csv, txt, xlsx, xml files are allowed.")
        );

        controller.start_upload().unwrap();
        assert_eq!(controller.phase(), UploadPhase::Uploading);
        assert!(controller.state().selected_file.is_some());
        release.notify_one();
        assert_eq!(controller.run_to_completion().await, UploadPhase::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn select_while_uploading_is_an_error() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();

        assert_eq!(controller.select(csv()), Err(ControllerError::UploadInProgress));
        assert_eq!(controller.start_upload(), Err(ControllerError::UploadInProgress));
        assert_eq!(controller.phase(), UploadPhase::Uploading);
    }

    #[tokio::test]
    async fn clear_only_from_terminal_phases() {
        let transport = FakeTransport::new(vec![(10, 100)], Ok(manifest("readings.csv")));
        let release = transport.release.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        assert_eq!(
            controller.clear(),
            Err(ControllerError::InvalidTransition {
                action: "clear",
                phase: UploadPhase::Selected,
            })
        );

        controller.start_upload().unwrap();
        assert_eq!(
            controller.clear(),
            Err(ControllerError::InvalidTransition {
                action: "clear",
                phase: UploadPhase::Uploading,
            })
        );

        controller.cancel().unwrap();
        controller.clear().unwrap();
        assert_eq!(controller.state(), &ClientUploadState::default());

        release.notify_one();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        controller.poll_events();
        assert_eq!(controller.phase(), UploadPhase::Idle);
    }

    /// Transport with a bug: reports some progress, then panics.
    struct PanickingTransport;

    #[async_trait]
    impl UploadTransport for PanickingTransport {
        async fn send(
            &self,
            _file: SelectedFile,
            progress: ProgressReporter,
            _cancel: CancellationToken,
        ) -> Result<UploadManifest, TransferError> {
            progress.report(10, 100);
            panic!("transport bug");
        }
    }

    #[tokio::test]
    async fn panicking_transport_fails_the_attempt() {
        let mut controller = UploadController::new(PanickingTransport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();

        let phase = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            controller.run_to_completion(),
        )
        .await
        .expect("controller never left Uploading");

        assert_eq!(phase, UploadPhase::Failed);
        assert_eq!(controller.progress(), 0);
        assert_eq!(
            controller.notice().map(|n| n.message.as_str()),
            Some("Upload interrupted")
        );

        controller.start_upload().unwrap();
        assert_eq!(controller.phase(), UploadPhase::Uploading);
    }

    #[tokio::test]
    async fn select_path_checks_size_before_reading() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let mut controller = UploadController::new(transport, UploadPolicy::default());
        let dir = tempfile::tempdir().unwrap();

        let big = dir.path().join("readings.csv");
        std::fs::File::create(&big)
            .unwrap()
            .set_len(10 * 1024 * 1024 + 1)
            .unwrap();
        let err = controller.select_path(&big).await.unwrap_err();
        assert_eq!(err.to_string(), "File exceeds maximum size of 10MB.");
        assert_eq!(controller.phase(), UploadPhase::Idle);
        assert_eq!(
            controller.notice().map(|n| n.level),
            Some(NoticeLevel::Warning)
        );

        let missing = controller.select_path(dir.path().join("nope.csv")).await;
        assert!(matches!(missing, Err(ControllerError::Unreadable(_))));

        let small = dir.path().join("sweep.xml");
        std::fs::write(&small, b"<sweep/>").unwrap();
        controller.select_path(&small).await.unwrap();
        assert_eq!(controller.phase(), UploadPhase::Selected);

        let selected = controller.state().selected_file.as_ref().unwrap();
        assert_eq!(selected.name(), "sweep.xml");
        assert_eq!(selected.size(), 8);
        assert_eq!(selected.mime_type(), None);
    }

    #[tokio::test]
    async fn completed_upload_cannot_restart_without_new_selection() {
        let transport = FakeTransport::new(vec![], Ok(manifest("readings.csv")));
        let release = transport.release.clone();
        let mut controller = UploadController::new(transport, UploadPolicy::default());

        controller.select(csv()).unwrap();
        controller.start_upload().unwrap();
        release.notify_one();
        assert_eq!(controller.run_to_completion().await, UploadPhase::Completed);

        assert_eq!(
            controller.start_upload(),
            Err(ControllerError::InvalidTransition {
                action: "start upload",
                phase: UploadPhase::Completed,
            })
        );
        assert_eq!(
            controller.cancel(),
            Err(ControllerError::InvalidTransition {
                action: "cancel",
                phase: UploadPhase::Completed,
            })
        );

        controller.select(csv()).unwrap();
        assert_eq!(controller.phase(), UploadPhase::Selected);
    }
}
