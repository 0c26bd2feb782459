pub mod health;
pub mod upload;

use crate::error::HttpAppError;
use axum::http::Uri;
use fra_core::AppError;

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> HttpAppError {
    HttpAppError(AppError::NotFound(format!("Route {} not found", uri.path())))
}
