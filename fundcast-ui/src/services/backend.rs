//! Fund-research backend API client
//!
//! Typed reqwest wrapper over the backend REST surface. All business
//! logic (report parsing, summarization, audio synthesis, persistence)
//! lives behind these endpoints; this client only moves JSON.
//!
//! Responses arrive wrapped in a `{"data": ...}` envelope. Typed methods
//! unwrap it; pass-through methods return the whole body for the browser
//! pages to consume unchanged.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{BatchImportOutcome, FundWatchItem, ReportViewpoint};

const USER_AGENT: &str = "fundcast-ui/0.1.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-request timeout for report viewpoint fetches. Report parsing on
/// the backend can take minutes on a cold cache.
pub const REPORT_TIMEOUT_SECS: u64 = 120;

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Backend `{"data": ...}` response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

fn unwrap_data<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    let envelope: Envelope<T> =
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(envelope.data)
}

/// Fund-research backend API client
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    report_timeout: Duration,
}

impl BackendClient {
    /// Create a client for the given backend base URL (no `/api` suffix)
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_report_timeout(base_url, Duration::from_secs(REPORT_TIMEOUT_SECS))
    }

    /// Create a client with a custom report-fetch timeout (tests use a
    /// short one; production keeps the 120s default)
    pub fn with_report_timeout(
        base_url: &str,
        report_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            report_timeout,
        })
    }

    /// Backend base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(timeout_secs)
        } else {
            BackendError::Network(e.to_string())
        }
    }

    /// Triage the response status, folding non-2xx into a single error
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn get_value(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, BackendError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, DEFAULT_TIMEOUT_SECS))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn post_value(&self, path: &str, body: Value) -> Result<Value, BackendError> {
        let response = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, DEFAULT_TIMEOUT_SECS))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn delete_value(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, BackendError> {
        let response = self
            .http
            .delete(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, DEFAULT_TIMEOUT_SECS))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// GET /api/funds/search?q= - fund lookup by code or name
    pub async fn search_funds(&self, query: &str) -> Result<Value, BackendError> {
        self.get_value("/funds/search", &[("q", query)]).await
    }

    /// POST /api/funds - add a fund to the device's watch-list
    pub async fn add_fund(&self, device_id: &str, fund_code: &str) -> Result<Value, BackendError> {
        self.post_value(
            "/funds",
            json!({ "device_id": device_id, "fund_code": fund_code }),
        )
        .await
    }

    /// GET /api/funds?device_id= - the device's watch-list, typed
    ///
    /// The batch fetcher consumes this list; order is the backend's
    /// insertion order and is preserved through the whole batch run.
    pub async fn watch_list(&self, device_id: &str) -> Result<Vec<FundWatchItem>, BackendError> {
        let value = self.get_value("/funds", &[("device_id", device_id)]).await?;
        unwrap_data(value)
    }

    /// GET /api/funds/all - every fund record known to the backend
    pub async fn all_funds(&self) -> Result<Value, BackendError> {
        self.get_value("/funds/all", &[]).await
    }

    /// DELETE /api/funds/{code}?device_id= - remove from watch-list
    pub async fn remove_fund(
        &self,
        device_id: &str,
        fund_code: &str,
    ) -> Result<Value, BackendError> {
        self.delete_value(&format!("/funds/{}", fund_code), &[("device_id", device_id)])
            .await
    }

    /// POST /api/funds/batch-import - bulk add by code list
    pub async fn batch_import(
        &self,
        fund_codes: &[String],
    ) -> Result<BatchImportOutcome, BackendError> {
        let value = self
            .post_value("/funds/batch-import", json!({ "fund_codes": fund_codes }))
            .await?;
        unwrap_data(value)
    }

    /// DELETE /api/funds/manage/{code} - hard-delete a fund record
    pub async fn delete_fund_record(&self, fund_code: &str) -> Result<Value, BackendError> {
        self.delete_value(&format!("/funds/manage/{}", fund_code), &[])
            .await
    }

    /// POST /api/podcasts/generate - start an async podcast generation job
    pub async fn generate_podcast(
        &self,
        fund_code: &str,
        device_id: &str,
        report_period: Option<&str>,
    ) -> Result<Value, BackendError> {
        self.post_value(
            "/podcasts/generate",
            json!({
                "fund_code": fund_code,
                "device_id": device_id,
                "report_period": report_period,
            }),
        )
        .await
    }

    /// GET /api/podcasts/{id} - fetch a podcast record
    pub async fn podcast(&self, id: i64) -> Result<Value, BackendError> {
        self.get_value(&format!("/podcasts/{}", id), &[]).await
    }

    /// GET /api/podcasts/{id}/status - poll generation job status
    pub async fn podcast_status(&self, id: i64) -> Result<Value, BackendError> {
        self.get_value(&format!("/podcasts/{}/status", id), &[]).await
    }

    /// DELETE /api/podcasts/{id} - remove a generated podcast
    pub async fn delete_podcast(&self, id: i64) -> Result<Value, BackendError> {
        self.delete_value(&format!("/podcasts/{}", id), &[]).await
    }

    /// GET /api/funds/{code}/report/{quarter} - one quarter's report
    /// viewpoint, typed
    ///
    /// This is the call the batch fetcher repeats. It carries its own
    /// independent timeout, non-renewable and unrelated to the
    /// inter-chunk delay.
    pub async fn report_viewpoint(
        &self,
        fund_code: &str,
        quarter: &str,
    ) -> Result<ReportViewpoint, BackendError> {
        let timeout_secs = self.report_timeout.as_secs();
        let response = self
            .http
            .get(self.url(&format!("/funds/{}/report/{}", fund_code, quarter)))
            .timeout(self.report_timeout)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, timeout_secs))?;

        let value: Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        unwrap_data(value)
    }
}
