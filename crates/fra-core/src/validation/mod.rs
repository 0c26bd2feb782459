//! Validation module
//!
//! Upload classification against the format allow-list and size ceiling.

pub mod upload;

pub use upload::{detect_mime_type, RejectReason, SizeGuard, UploadPolicy, Verdict};
