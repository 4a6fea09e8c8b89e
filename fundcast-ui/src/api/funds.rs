//! Watch-list API handlers
//!
//! Thin proxies over the backend fund endpoints. The device identifier
//! is injected from application state so the pages never handle it.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use fundcast_common::events::FundcastEvent;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/funds/search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// POST /api/funds request
#[derive(Debug, Deserialize)]
pub struct AddFundRequest {
    pub fund_code: String,
}

/// POST /api/funds/batch-import request
#[derive(Debug, Deserialize)]
pub struct BatchImportRequest {
    pub fund_codes: Vec<String>,
}

/// GET /api/funds/search?q= - fund lookup by code or name
pub async fn search_funds(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("Search query must not be empty".to_string()));
    }

    let body = state.backend.search_funds(query.trim()).await?;
    Ok(Json(body))
}

/// POST /api/funds - add a fund to this device's watch-list
pub async fn add_fund(
    State(state): State<AppState>,
    Json(request): Json<AddFundRequest>,
) -> ApiResult<Json<Value>> {
    if request.fund_code.trim().is_empty() {
        return Err(ApiError::BadRequest("Fund code must not be empty".to_string()));
    }

    let body = state
        .backend
        .add_fund(&state.device_id, request.fund_code.trim())
        .await?;

    tracing::info!(fund = %request.fund_code.trim(), "Fund added to watch-list");
    state.event_bus.emit_lossy(FundcastEvent::WatchListChanged {
        device_id: state.device_id.clone(),
        timestamp: Utc::now(),
    });

    Ok(Json(body))
}

/// GET /api/funds - this device's watch-list
pub async fn list_funds(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let funds = state.backend.watch_list(&state.device_id).await?;
    Ok(Json(serde_json::json!({ "data": funds })))
}

/// GET /api/funds/all - every fund record known to the backend
pub async fn list_all_funds(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let body = state.backend.all_funds().await?;
    Ok(Json(body))
}

/// DELETE /api/funds/{code} - remove a fund from the watch-list
pub async fn remove_fund(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Value>> {
    let body = state.backend.remove_fund(&state.device_id, &code).await?;

    tracing::info!(fund = %code, "Fund removed from watch-list");
    state.event_bus.emit_lossy(FundcastEvent::WatchListChanged {
        device_id: state.device_id.clone(),
        timestamp: Utc::now(),
    });

    Ok(Json(body))
}

/// POST /api/funds/batch-import - bulk add by code list
pub async fn batch_import(
    State(state): State<AppState>,
    Json(request): Json<BatchImportRequest>,
) -> ApiResult<Json<Value>> {
    if request.fund_codes.is_empty() {
        return Err(ApiError::BadRequest("Fund code list must not be empty".to_string()));
    }

    let outcome = state.backend.batch_import(&request.fund_codes).await?;

    tracing::info!(
        imported = outcome.success.len(),
        rejected = outcome.failed.len(),
        "Bulk fund import finished"
    );
    state.event_bus.emit_lossy(FundcastEvent::WatchListChanged {
        device_id: state.device_id.clone(),
        timestamp: Utc::now(),
    });

    Ok(Json(serde_json::json!({ "data": outcome })))
}

/// DELETE /api/funds/manage/{code} - hard-delete a fund record
pub async fn delete_fund_record(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Value>> {
    let body = state.backend.delete_fund_record(&code).await?;

    tracing::info!(fund = %code, "Fund record deleted");

    Ok(Json(body))
}

/// Build watch-list routes
pub fn fund_routes() -> Router<AppState> {
    Router::new()
        .route("/api/funds/search", get(search_funds))
        .route("/api/funds", post(add_fund).get(list_funds))
        .route("/api/funds/all", get(list_all_funds))
        .route("/api/funds/batch-import", post(batch_import))
        .route("/api/funds/manage/:code", delete(delete_fund_record))
        .route("/api/funds/:code", delete(remove_fund))
}
