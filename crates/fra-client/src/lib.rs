//! Upload client for the FRA ingest API.
//!
//! [`UploadController`] is the upload state machine a dashboard drives: select a file, start
//! the upload, follow progress, cancel or clear. The network side sits behind
//! [`UploadTransport`]; [`ReqwestTransport`] posts to the ingest endpoint through [`ApiClient`].

pub mod client;
pub mod controller;
pub mod transport;

pub use client::{api_prefix, ApiClient};
pub use controller::{
    ClientUploadState, ControllerError, Notice, NoticeLevel, SelectedFile, UploadController,
    UploadPhase,
};
pub use transport::{ProgressReporter, ReqwestTransport, TransferError, UploadTransport};
