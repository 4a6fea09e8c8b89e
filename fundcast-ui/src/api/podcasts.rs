//! Podcast API handlers
//!
//! Generation is asynchronous on the backend; the pages poll the status
//! endpoint until the job reaches completed or failed.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/podcasts/generate request
#[derive(Debug, Deserialize)]
pub struct GeneratePodcastRequest {
    pub fund_code: String,
    pub report_period: Option<String>,
}

/// POST /api/podcasts/generate - start an async generation job
///
/// The backend reuses a completed podcast for the same fund and period,
/// so repeated requests are cheap.
pub async fn generate_podcast(
    State(state): State<AppState>,
    Json(request): Json<GeneratePodcastRequest>,
) -> ApiResult<Json<Value>> {
    if request.fund_code.trim().is_empty() {
        return Err(ApiError::BadRequest("Fund code must not be empty".to_string()));
    }

    let body = state
        .backend
        .generate_podcast(
            request.fund_code.trim(),
            &state.device_id,
            request.report_period.as_deref(),
        )
        .await?;

    tracing::info!(
        fund = %request.fund_code.trim(),
        report_period = request.report_period.as_deref().unwrap_or("default"),
        "Podcast generation requested"
    );

    Ok(Json(body))
}

/// GET /api/podcasts/{id} - fetch a podcast record
pub async fn get_podcast(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let body = state.backend.podcast(id).await?;
    Ok(Json(body))
}

/// GET /api/podcasts/{id}/status - poll generation job status
pub async fn get_podcast_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let body = state.backend.podcast_status(id).await?;
    Ok(Json(body))
}

/// DELETE /api/podcasts/{id} - remove a generated podcast
pub async fn delete_podcast(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let body = state.backend.delete_podcast(id).await?;

    tracing::info!(podcast_id = id, "Podcast deleted");

    Ok(Json(body))
}

/// Build podcast routes
pub fn podcast_routes() -> Router<AppState> {
    Router::new()
        .route("/api/podcasts/generate", post(generate_podcast))
        .route("/api/podcasts/:id", get(get_podcast).delete(delete_podcast))
        .route("/api/podcasts/:id/status", get(get_podcast_status))
}
