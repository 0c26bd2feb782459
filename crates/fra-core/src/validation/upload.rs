//! Upload classification.
//!
//! The extension allow-list is authoritative. The declared MIME type is advisory on the
//! server; the client additionally requires it to agree with the extension when one is given.

use std::fmt;

use crate::constants::DEFAULT_MAX_FILE_SIZE_BYTES;
use crate::error::AppError;
use crate::formats::{normalize_mime_type, FileFormat};

const GENERIC_MIME_TYPE: &str = "application/octet-stream";
const MIB: u64 = 1024 * 1024;

/// Outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(FileFormat),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }

    pub fn into_result(self) -> Result<FileFormat, RejectReason> {
        match self {
            Verdict::Accept(format) => Ok(format),
            Verdict::Reject(reason) => Err(reason),
        }
    }
}

/// Why a file was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("File name is missing")]
    MissingFileName,

    #[error("Invalid file type. Only {} files are allowed.", join_formats(.allowed))]
    UnsupportedType {
        extension: Option<String>,
        allowed: Vec<FileFormat>,
    },

    #[error("Declared type '{content_type}' does not match a .{format} file")]
    MimeMismatch {
        content_type: String,
        format: FileFormat,
    },

    #[error("File exceeds maximum size of {}.", format_limit(*.max))]
    FileTooLarge { size: u64, max: u64 },
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::MissingFileName => AppError::InvalidInput(reason.to_string()),
            RejectReason::UnsupportedType { .. } | RejectReason::MimeMismatch { .. } => {
                AppError::UnsupportedFileType(reason.to_string())
            }
            RejectReason::FileTooLarge { .. } => AppError::FileTooLarge(reason.to_string()),
        }
    }
}

fn join_formats(formats: &[FileFormat]) -> String {
    formats
        .iter()
        .map(|f| f.extension())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_limit(max: u64) -> String {
    if max >= MIB && max % MIB == 0 {
        format!("{}MB", max / MIB)
    } else {
        format!("{} bytes", max)
    }
}

/// Allow-list and size ceiling applied to every uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed: Vec<FileFormat>,
    max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(FileFormat::ALL.to_vec(), DEFAULT_MAX_FILE_SIZE_BYTES as u64)
    }
}

impl UploadPolicy {
    pub fn new(allowed: Vec<FileFormat>, max_file_size: u64) -> Self {
        Self {
            allowed,
            max_file_size,
        }
    }

    pub fn allowed_formats(&self) -> &[FileFormat] {
        &self.allowed
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// MIME types accepted by the client-side check, derived from the allowed formats.
    pub fn allowed_mime_types(&self) -> Vec<&'static str> {
        self.allowed
            .iter()
            .flat_map(|f| f.mime_types().iter().copied())
            .collect()
    }

    /// Classify a file by its declared name. The declared content type is accepted for
    /// symmetry with the client contract but never decides the outcome here.
    pub fn classify(&self, file_name: &str, _declared_content_type: Option<&str>) -> Verdict {
        if file_name.trim().is_empty() {
            return Verdict::Reject(RejectReason::MissingFileName);
        }

        match FileFormat::from_file_name(file_name) {
            Some(format) if self.allowed.contains(&format) => Verdict::Accept(format),
            _ => Verdict::Reject(RejectReason::UnsupportedType {
                extension: std::path::Path::new(file_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase()),
                allowed: self.allowed.clone(),
            }),
        }
    }

    /// Full check for a file whose size is already known.
    pub fn check(&self, file_name: &str, declared_content_type: Option<&str>, size: u64) -> Verdict {
        match self.classify(file_name, declared_content_type) {
            Verdict::Accept(_) if size > self.max_file_size => {
                Verdict::Reject(RejectReason::FileTooLarge {
                    size,
                    max: self.max_file_size,
                })
            }
            verdict => verdict,
        }
    }

    /// Check applied on the client before anything is sent: the server check plus agreement
    /// between the declared MIME type and the extension.
    pub fn check_selection(
        &self,
        file_name: &str,
        declared_content_type: Option<&str>,
        size: u64,
    ) -> Verdict {
        let format = match self.check(file_name, declared_content_type, size) {
            Verdict::Accept(format) => format,
            rejected => return rejected,
        };

        match declared_content_type.map(normalize_mime_type) {
            Some(ct) if !ct.is_empty() && ct != GENERIC_MIME_TYPE && !format.matches_mime_type(&ct) => {
                Verdict::Reject(RejectReason::MimeMismatch {
                    content_type: ct,
                    format,
                })
            }
            _ => Verdict::Accept(format),
        }
    }

    /// Start an incremental size check for a streamed file.
    pub fn size_guard(&self) -> SizeGuard {
        SizeGuard::new(self.max_file_size)
    }
}

/// MIME type reported for a stored file: the declared one when it is specific, otherwise
/// the canonical type of the detected format.
pub fn detect_mime_type(format: FileFormat, declared_content_type: Option<&str>) -> String {
    match declared_content_type.map(normalize_mime_type) {
        Some(ct) if !ct.is_empty() && ct != GENERIC_MIME_TYPE => ct,
        _ => format.canonical_mime_type().to_string(),
    }
}

/// Running byte count for a streamed file; rejects as soon as the ceiling is crossed.
#[derive(Debug, Clone)]
pub struct SizeGuard {
    max: u64,
    seen: u64,
}

impl SizeGuard {
    pub fn new(max: u64) -> Self {
        Self { max, seen: 0 }
    }

    /// Account for the next chunk.
    pub fn observe(&mut self, chunk_len: usize) -> Result<u64, RejectReason> {
        let seen = self.seen.saturating_add(chunk_len as u64);
        if seen > self.max {
            return Err(RejectReason::FileTooLarge {
                size: seen,
                max: self.max,
            });
        }
        self.seen = seen;
        Ok(seen)
    }

    pub fn bytes_seen(&self) -> u64 {
        self.seen
    }
}

impl fmt::Display for SizeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} bytes", self.seen, self.max)
    }
}
