//! API error type for fundcast-ui
//!
//! Handler failures surface to the pages as `{"error": {code, message}}`
//! JSON bodies. Upstream backend failures map to 502 so the pages can
//! tell a misbehaving backend from a local bug.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::BackendError;

/// Errors a request handler can produce
#[derive(Debug, Error)]
pub enum ApiError {
    /// No such run, fund, or persisted result set (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Malformed or empty request input (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A batch run is already active (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The fund-research backend misbehaved (502)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Shared-layer failure: local database or stored value (500)
    #[error("Storage error: {0}")]
    Storage(#[from] fundcast_common::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Backend(_) => "BACKEND_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
