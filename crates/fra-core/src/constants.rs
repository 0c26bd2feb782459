//! Constants shared by the server and the client.

/// Multipart field that carries the uploaded measurement files.
pub const UPLOAD_FIELD_NAME: &str = "content";

/// Default per-file size ceiling (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Default maximum number of files accepted in one request.
pub const DEFAULT_MAX_FILES_PER_REQUEST: usize = 5;

/// Default API version segment, giving the `/api/v1` prefix.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Build the API prefix (e.g. "/api/v1") for a version segment.
pub fn api_prefix(version: &str) -> String {
    format!("/api/{}", version.trim_matches('/'))
}
