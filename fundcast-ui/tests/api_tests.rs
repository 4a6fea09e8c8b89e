//! Integration tests for fundcast-ui API endpoints
//!
//! Drives the router with tower's `oneshot`, backed by an in-memory
//! database and a stub backend on an ephemeral port.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Path,
    http::{header, Request, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use fundcast_common::db::init_memory_pool;
use fundcast_common::events::EventBus;
use fundcast_ui::db::reports::save_last_run;
use fundcast_ui::models::{BatchRun, BatchState, ReportFetchResult};
use fundcast_ui::services::BackendClient;
use fundcast_ui::{build_router, AppState};

/// Stub backend serving a fixed two-fund watch-list and fast report
/// viewpoints
async fn spawn_stub_backend() -> String {
    let app = Router::new()
        .route(
            "/api/funds",
            get(|| async {
                Json(json!({
                    "data": [
                        { "code": "f1", "name": "Fund f1", "full_name": null,
                          "manager": "M. Ling", "fund_type": "equity", "fund_company": null },
                        { "code": "f2", "name": "Fund f2", "full_name": null,
                          "manager": null, "fund_type": null, "fund_company": null },
                    ]
                }))
            }),
        )
        .route(
            "/api/funds/search",
            get(|| async {
                Json(json!({ "data": [
                    { "code": "f9", "name": "Fund f9", "full_name": null,
                      "manager": null, "fund_type": null, "fund_company": null },
                ] }))
            }),
        )
        .route(
            "/api/funds/:code/report/:quarter",
            get(|Path((code, quarter)): Path<(String, String)>| async move {
                Json(json!({
                    "data": {
                        "fund_code": code,
                        "report_period": quarter,
                        "viewpoint": format!("Viewpoint for {}", code),
                        "fund_info": { "name": format!("Fund {}", code), "manager": "M. Ling" },
                    }
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Stub backend whose watch-list is empty
async fn spawn_empty_backend() -> String {
    let app = Router::new().route("/api/funds", get(|| async { Json(json!({ "data": [] })) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Test helper: build app state against the given backend base URL
async fn setup_state(backend_url: &str) -> AppState {
    let db = init_memory_pool().await.unwrap();
    let backend = Arc::new(BackendClient::new(backend_url).unwrap());
    AppState::new(db, EventBus::new(100), backend, "user_test12345".to_string())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn seeded_results() -> Vec<ReportFetchResult> {
    vec![
        ReportFetchResult::success(
            "f1".to_string(),
            "Fund f1".to_string(),
            Some("Constructive on duration.".to_string()),
            Some("M. Ling".to_string()),
        ),
        ReportFetchResult::failure(
            "f2".to_string(),
            "Fund f2".to_string(),
            "Request timed out after 120s".to_string(),
        ),
    ]
}

// =============================================================================
// Health and UI pages
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "fundcast-ui");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ui_pages_served() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app.clone().oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get_request("/reports")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/static/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/javascript"
    );
}

// =============================================================================
// Watch-list proxies
// =============================================================================

#[tokio::test]
async fn test_search_requires_query() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app
        .oneshot(get_request("/api/funds/search?q=%20"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_search_proxies_backend() {
    let backend = spawn_stub_backend().await;
    let state = setup_state(&backend).await;
    let app = build_router(state);

    let response = app
        .oneshot(get_request("/api/funds/search?q=f9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"][0]["code"], "f9");
}

#[tokio::test]
async fn test_list_funds_injects_device_id() {
    let backend = spawn_stub_backend().await;
    let state = setup_state(&backend).await;
    let app = build_router(state);

    let response = app.oneshot(get_request("/api/funds")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_backend_failure_maps_to_bad_gateway() {
    // Nothing listens on this address
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app.oneshot(get_request("/api/funds")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BACKEND_ERROR");
}

#[tokio::test]
async fn test_batch_import_rejects_empty_list() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json("/api/funds/batch-import", json!({ "fund_codes": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Batch run lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_batch_rejects_blank_quarter() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json("/api/reports/batch/start", json!({ "quarter": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_start_batch_rejects_empty_watchlist() {
    let backend = spawn_empty_backend().await;
    let state = setup_state(&backend).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json("/api/reports/batch/start", json!({ "quarter": "2024Q4" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_batch_conflicts_with_active_run() {
    let backend = spawn_stub_backend().await;
    let state = setup_state(&backend).await;

    // A run is already active
    let running = BatchRun::new("2024Q3".to_string(), 2);
    state.runs.write().await.insert(running.run_id, running);

    let app = build_router(state);
    let response = app
        .oneshot(post_json("/api/reports/batch/start", json!({ "quarter": "2024Q4" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_poll_unknown_run_is_not_found() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app
        .oneshot(get_request(
            "/api/reports/batch/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_terminal_run_rejected() {
    let state = setup_state("http://127.0.0.1:1").await;

    let mut run = BatchRun::new("2024Q4".to_string(), 2);
    run.transition_to(BatchState::Completed);
    let run_id = run.run_id;
    state.runs.write().await.insert(run_id, run);

    let app = build_router(state);
    let response = app
        .oneshot(post_json(
            &format!("/api/reports/batch/{}/cancel", run_id),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_batch_flow_reaches_summary() {
    let backend = spawn_stub_backend().await;
    let state = setup_state(&backend).await;
    let app = build_router(state.clone());

    // Start a run over the stub's two-fund watch-list (one chunk)
    let response = app
        .clone()
        .oneshot(post_json("/api/reports/batch/start", json!({ "quarter": "2024Q4" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let run_id = body["run_id"].as_str().unwrap().to_string();
    assert_eq!(body["state"], "RUNNING");
    assert_eq!(body["total_funds"], 2);

    // Poll until the background task reaches a terminal state
    let mut terminal = None;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/reports/batch/{}", run_id)))
            .await
            .unwrap();
        let run = extract_json(response.into_body()).await;
        if run["state"] == "COMPLETED" || run["state"] == "CANCELLED" {
            terminal = Some(run);
            break;
        }
    }
    let run = terminal.expect("run should complete within the poll window");
    assert_eq!(run["state"], "COMPLETED");
    assert_eq!(run["results"].as_array().unwrap().len(), 2);

    // Summary view reads the persisted set
    let response = app.oneshot(get_request("/api/reports/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["quarter"], "2024Q4");
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["succeeded"], 2);
    assert_eq!(summary["failed"], 0);
}

// =============================================================================
// Summary, retry, export
// =============================================================================

#[tokio::test]
async fn test_summary_without_persisted_run_is_not_found() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app.oneshot(get_request("/api/reports/summary")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_summary_counts_successes_and_failures() {
    let state = setup_state("http://127.0.0.1:1").await;
    save_last_run(&state.db, "2024Q4", &seeded_results()).await.unwrap();

    let app = build_router(state);
    let response = app.oneshot(get_request("/api/reports/summary")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["succeeded"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["results"][0]["fund_code"], "f1");
}

#[tokio::test]
async fn test_retry_without_persisted_run_is_not_found() {
    let state = setup_state("http://127.0.0.1:1").await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json("/api/reports/retry", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_retry_endpoint_splices_failed_entry() {
    let backend = spawn_stub_backend().await;
    let state = setup_state(&backend).await;
    save_last_run(&state.db, "2024Q4", &seeded_results()).await.unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(post_json(
            "/api/reports/retry",
            json!({ "fund_codes": ["f2"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["succeeded"], 2);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["results"][1]["viewpoint"], "Viewpoint for f2");
    // Untouched entry keeps its original viewpoint
    assert_eq!(summary["results"][0]["viewpoint"], "Constructive on duration.");
}

#[tokio::test]
async fn test_export_markdown_download() {
    let state = setup_state("http://127.0.0.1:1").await;
    save_last_run(&state.db, "2024Q4", &seeded_results()).await.unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(get_request("/api/reports/summary/export"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/markdown; charset=utf-8"
    );
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("fund_report_summary_2024Q4.md"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let markdown = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(markdown.contains("- Fetched successfully: 1"));
    assert!(markdown.contains("- Failed: 1"));
}
