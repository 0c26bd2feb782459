use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::formats::FileFormat;

/// A file that has been accepted and durably written.
///
/// Created exactly once per accepted file and never mutated afterwards; how long it is
/// kept is decided outside the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub original_name: String,
    pub stored_key: String,
    /// Locator under which the storage backend serves the file.
    pub path: String,
    pub byte_size: u64,
    pub declared_mime_type: Option<String>,
    /// MIME type reported to clients (declared when specific, otherwise derived from `format`).
    pub mime_type: String,
    pub format: FileFormat,
    pub accepted_at: DateTime<Utc>,
}

/// Per-file entry of an [`UploadManifest`], in the wire shape clients consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileSummary {
    pub original_name: String,
    /// Storage key the file was written under.
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub mimetype: String,
}

impl From<&StoredFile> for StoredFileSummary {
    fn from(file: &StoredFile) -> Self {
        Self {
            original_name: file.original_name.clone(),
            filename: file.stored_key.clone(),
            path: file.path.clone(),
            size: file.byte_size,
            mimetype: file.mime_type.clone(),
        }
    }
}

/// Snapshot of the files accepted by one upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadManifest {
    pub files_count: usize,
    pub files: Vec<StoredFileSummary>,
}

impl UploadManifest {
    pub fn from_stored(files: &[StoredFile]) -> Self {
        let files: Vec<StoredFileSummary> = files.iter().map(StoredFileSummary::from).collect();
        Self {
            files_count: files.len(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_serializes_in_wire_shape() {
        let stored = StoredFile {
            original_name: "readings.csv".to_string(),
            stored_key: "readings-1700000000000-0-0a1b2c3d.csv".to_string(),
            path: "public/readings-1700000000000-0-0a1b2c3d.csv".to_string(),
            byte_size: 2048,
            declared_mime_type: Some("text/csv".to_string()),
            mime_type: "text/csv".to_string(),
            format: FileFormat::Csv,
            accepted_at: Utc::now(),
        };

        let json = serde_json::to_value(UploadManifest::from_stored(&[stored])).unwrap();
        assert_eq!(json["filesCount"], 1);
        assert_eq!(json["files"][0]["originalName"], "readings.csv");
        assert_eq!(
            json["files"][0]["filename"],
            "readings-1700000000000-0-0a1b2c3d.csv"
        );
        assert_eq!(json["files"][0]["size"], 2048);
        assert_eq!(json["files"][0]["mimetype"], "text/csv");
    }
}
