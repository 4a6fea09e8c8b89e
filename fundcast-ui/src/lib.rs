//! fundcast-ui library interface
//!
//! The browser-facing module of the fund-research podcast tool: serves
//! the embedded pages, proxies the external backend, and runs the batch
//! report fetcher. Exposed as a library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use fundcast_common::events::EventBus;

use crate::models::BatchRun;
use crate::services::BackendClient;

/// Snapshot registry of batch runs, updated whole-object per chunk
pub type RunRegistry = Arc<RwLock<HashMap<Uuid, BatchRun>>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Local database connection pool (settings, persisted batch results)
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Fund-research backend client
    pub backend: Arc<BackendClient>,
    /// Opaque device identifier scoping watch-list calls
    pub device_id: String,
    /// Batch run snapshots for polling
    pub runs: RunRegistry,
    /// Cancellation tokens for active batch runs
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        backend: Arc<BackendClient>,
        device_id: String,
    ) -> Self {
        Self {
            db,
            event_bus,
            backend,
            device_id,
            runs: Arc::new(RwLock::new(HashMap::new())),
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML pages + scripts)
        .merge(api::ui_routes())
        // API routes
        .merge(api::fund_routes())
        .merge(api::podcast_routes())
        .merge(api::report_routes())
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
