//! Batch report API handlers
//!
//! POST /api/reports/batch/start, GET /api/reports/batch/{run_id},
//! POST /api/reports/batch/{run_id}/cancel, POST /api/reports/retry,
//! GET /api/reports/summary, GET /api/reports/summary/export

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::reports::{load_last_run, StoredReports};
use crate::error::{ApiError, ApiResult};
use crate::models::{BatchRun, BatchState, ReportFetchResult};
use crate::services::BatchFetcher;
use crate::AppState;

/// POST /api/reports/batch/start request
#[derive(Debug, Deserialize)]
pub struct StartBatchRequest {
    pub quarter: String,
}

/// POST /api/reports/batch/start response
#[derive(Debug, Serialize)]
pub struct StartBatchResponse {
    pub run_id: Uuid,
    pub quarter: String,
    pub state: BatchState,
    pub total_funds: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/reports/batch/{run_id}/cancel response
#[derive(Debug, Serialize)]
pub struct CancelBatchResponse {
    pub run_id: Uuid,
    pub state: BatchState,
    pub cancel_requested: bool,
    pub requested_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/reports/retry request
#[derive(Debug, Deserialize, Default)]
pub struct RetryRequest {
    /// Fund codes to retry; empty or absent retries every failed entry
    #[serde(default)]
    pub fund_codes: Vec<String>,
}

/// Summary payload for the report summary view
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub quarter: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ReportFetchResult>,
}

impl From<StoredReports> for SummaryResponse {
    fn from(stored: StoredReports) -> Self {
        Self {
            quarter: stored.quarter.clone(),
            total: stored.results.len(),
            succeeded: stored.succeeded(),
            failed: stored.failed(),
            results: stored.results,
        }
    }
}

/// POST /api/reports/batch/start
///
/// Begin a batch run over the device's watch-list. Only one run may be
/// active per process; a second start while one is running is a 409.
pub async fn start_batch(
    State(state): State<AppState>,
    Json(request): Json<StartBatchRequest>,
) -> ApiResult<Json<StartBatchResponse>> {
    let quarter = request.quarter.trim().to_string();
    if quarter.is_empty() {
        return Err(ApiError::BadRequest("Quarter must not be empty".to_string()));
    }

    let funds = state.backend.watch_list(&state.device_id).await?;
    if funds.is_empty() {
        return Err(ApiError::BadRequest(
            "Watch-list is empty, nothing to fetch".to_string(),
        ));
    }

    let run = BatchRun::new(quarter, funds.len());
    let response = StartBatchResponse {
        run_id: run.run_id,
        quarter: run.quarter.clone(),
        state: run.state,
        total_funds: funds.len(),
        started_at: run.started_at,
    };

    // Guard and insert under one lock so two concurrent starts cannot
    // both become active
    {
        let mut runs = state.runs.write().await;
        if runs.values().any(|run| !run.is_terminal()) {
            return Err(ApiError::Conflict("Batch run already active".to_string()));
        }
        // A fresh run starts a new instance of the run state
        runs.retain(|_, run| !run.is_terminal());
        runs.insert(run.run_id, run.clone());
    }

    let cancel_token = CancellationToken::new();
    state
        .cancellation_tokens
        .write()
        .await
        .insert(run.run_id, cancel_token.clone());

    tracing::info!(
        run_id = %run.run_id,
        quarter = %run.quarter,
        total = funds.len(),
        "Batch run started"
    );

    // Background task owns the run to its terminal state
    let state_clone = state.clone();
    let run_id = run.run_id;
    tokio::spawn(async move {
        let fetcher = BatchFetcher::new(
            state_clone.backend.clone(),
            state_clone.db.clone(),
            state_clone.event_bus.clone(),
            state_clone.runs.clone(),
        );

        if let Err(e) = fetcher.execute(run, funds, cancel_token).await {
            tracing::error!(run_id = %run_id, error = %e, "Batch run task failed");
        }

        state_clone.cancellation_tokens.write().await.remove(&run_id);
    });

    Ok(Json(response))
}

/// GET /api/reports/batch/{run_id}
///
/// Poll batch run progress. Returns the latest whole-run snapshot.
pub async fn get_batch_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<BatchRun>> {
    let runs = state.runs.read().await;
    let run = runs
        .get(&run_id)
        .ok_or_else(|| ApiError::NotFound(format!("Batch run not found: {}", run_id)))?;

    Ok(Json(run.clone()))
}

/// POST /api/reports/batch/{run_id}/cancel
///
/// Request cooperative cancellation. In-flight requests settle; only
/// chunk scheduling stops.
pub async fn cancel_batch_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<CancelBatchResponse>> {
    let run_state = {
        let runs = state.runs.read().await;
        let run = runs
            .get(&run_id)
            .ok_or_else(|| ApiError::NotFound(format!("Batch run not found: {}", run_id)))?;
        run.state
    };

    if !matches!(run_state, BatchState::Running) {
        return Err(ApiError::BadRequest(format!(
            "Batch run already in terminal state: {:?}",
            run_state
        )));
    }

    if let Some(token) = state.cancellation_tokens.read().await.get(&run_id) {
        token.cancel();
    }

    tracing::info!(run_id = %run_id, "Batch run cancellation requested");

    Ok(Json(CancelBatchResponse {
        run_id,
        state: run_state,
        cancel_requested: true,
        requested_at: Utc::now(),
    }))
}

/// POST /api/reports/retry
///
/// Re-fetch only the named fund codes (or every failed entry when none
/// are named) and splice the outcomes into the persisted result set.
pub async fn retry_reports(
    State(state): State<AppState>,
    Json(request): Json<RetryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    let fetcher = BatchFetcher::new(
        state.backend.clone(),
        state.db.clone(),
        state.event_bus.clone(),
        state.runs.clone(),
    );

    let stored = fetcher
        .retry(&request.fund_codes)
        .await?
        .ok_or_else(|| ApiError::NotFound("No batch results persisted yet".to_string()))?;

    Ok(Json(stored.into()))
}

/// GET /api/reports/summary
///
/// The last completed run's persisted results, with counts.
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let stored = load_last_run(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("No batch results persisted yet".to_string()))?;

    Ok(Json(stored.into()))
}

/// GET /api/reports/summary/export
///
/// Markdown rendering of the persisted result set, served as a download.
pub async fn export_summary(State(state): State<AppState>) -> ApiResult<Response> {
    let stored = load_last_run(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("No batch results persisted yet".to_string()))?;

    let filename = format!("fund_report_summary_{}.md", stored.quarter);
    let markdown = render_summary_markdown(&stored);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        markdown,
    )
        .into_response())
}

/// Render the persisted result set as a Markdown report
fn render_summary_markdown(stored: &StoredReports) -> String {
    let successful: Vec<&ReportFetchResult> =
        stored.results.iter().filter(|r| r.success).collect();
    let failed: Vec<&ReportFetchResult> =
        stored.results.iter().filter(|r| !r.success).collect();

    let mut md = String::new();
    md.push_str("# Fund Quarterly Report Viewpoints\n\n");
    md.push_str(&format!("**Report period**: {}\n", stored.quarter));
    md.push_str(&format!(
        "**Generated**: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str("---\n\n");
    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Total funds: {}\n", stored.results.len()));
    md.push_str(&format!("- Fetched successfully: {}\n", successful.len()));
    md.push_str(&format!("- Failed: {}\n\n", failed.len()));
    md.push_str("---\n\n");

    if !successful.is_empty() {
        md.push_str("## Viewpoints\n\n");
        for r in &successful {
            md.push_str(&format!("### {} ({})\n\n", r.fund_name, r.fund_code));
            if let Some(manager) = &r.manager {
                md.push_str(&format!("**Fund manager**: {}\n\n", manager));
            }
            md.push_str(&format!(
                "{}\n\n",
                r.viewpoint.as_deref().unwrap_or("No viewpoint available")
            ));
            md.push_str("---\n\n");
        }
    }

    if !failed.is_empty() {
        md.push_str("## Failed funds\n\n");
        for r in &failed {
            md.push_str(&format!(
                "- {} ({}): {}\n",
                r.fund_name,
                r.fund_code,
                r.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    md
}

/// Build batch report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports/batch/start", post(start_batch))
        .route("/api/reports/batch/:run_id", get(get_batch_run))
        .route("/api/reports/batch/:run_id/cancel", post(cancel_batch_run))
        .route("/api/reports/retry", post(retry_reports))
        .route("/api/reports/summary", get(get_summary))
        .route("/api/reports/summary/export", get(export_summary))
}
