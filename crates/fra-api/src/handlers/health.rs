//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use fra_core::models::ApiResponse;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub environment: String,
    pub storage: String,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, state.storage.health_check())
        .await
    {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Storage health check failed");
            format!("unhealthy: {}", e)
        }
        Err(_) => {
            tracing::error!("Storage health check timed out");
            "timeout".to_string()
        }
    };

    let healthy = storage == "healthy";
    let mut body = ApiResponse::success(
        if healthy {
            "Server is running"
        } else {
            "Storage is unavailable"
        },
        HealthData {
            environment: state.config.environment().to_string(),
            storage,
        },
    );
    body.success = healthy;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
