use crate::error::HttpAppError;
use crate::services::analysis;
use crate::services::ingest::IngestService;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use fra_core::models::{ApiResponse, UploadManifest};
use std::sync::Arc;

/// `POST {api_prefix}/upload`: accept 1 to `MAX_FILES_PER_REQUEST` files in field `content`.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadManifest>>, HttpAppError> {
    let multipart = multipart?;

    let stored = IngestService::new(&state).ingest(multipart).await?;
    let manifest = UploadManifest::from_stored(&stored);

    analysis::dispatch(state.analysis.clone(), stored);

    Ok(Json(ApiResponse::success(
        "Files uploaded successfully",
        manifest,
    )))
}
