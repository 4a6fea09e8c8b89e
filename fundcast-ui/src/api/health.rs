//! Module health endpoint

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health
///
/// Liveness probe: reports the module name and build version. Does not
/// touch the backend, so it stays green while the backend is down.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "fundcast-ui",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
