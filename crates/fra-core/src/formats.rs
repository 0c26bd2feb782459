//! Recognized measurement file formats.
//!
//! The server's extension allow-list and the client's MIME allow-list are both derived from
//! [`FileFormat`], so the two checks cannot drift apart.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// Tabular/text formats an FRA export can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Txt,
    Xlsx,
    Xml,
}

impl FileFormat {
    pub const ALL: [FileFormat; 4] = [
        FileFormat::Csv,
        FileFormat::Txt,
        FileFormat::Xlsx,
        FileFormat::Xml,
    ];

    /// Canonical lowercase extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Txt => "txt",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xml => "xml",
        }
    }

    /// MIME types browsers and HTTP clients commonly declare for this format.
    /// The first entry is the canonical one.
    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Csv => &["text/csv", "application/csv", "application/vnd.ms-excel"],
            FileFormat::Txt => &["text/plain"],
            FileFormat::Xlsx => &[
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ],
            FileFormat::Xml => &["application/xml", "text/xml"],
        }
    }

    pub fn canonical_mime_type(&self) -> &'static str {
        self.mime_types()[0]
    }

    /// Detect the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }

    /// Whether `content_type` is one of this format's MIME types. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn matches_mime_type(&self, content_type: &str) -> bool {
        let normalized = normalize_mime_type(content_type);
        self.mime_types()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&normalized))
    }
}

impl FromStr for FileFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ext = s.trim().trim_start_matches('.').to_lowercase();
        FileFormat::ALL
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or_else(|| anyhow::anyhow!("Unknown file format: {}", s))
    }
}

impl Display for FileFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}

/// Strip MIME parameters and surrounding whitespace ("text/csv; charset=utf-8" -> "text/csv").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}
