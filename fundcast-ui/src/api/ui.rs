//! UI serving routes
//!
//! Serves the embedded HTML/JS pages: the watch-list page and the
//! report summary page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../ui/index.html");
const REPORTS_HTML: &str = include_str!("../ui/reports.html");
const APP_JS: &str = include_str!("../ui/app.js");
const REPORTS_JS: &str = include_str!("../ui/reports.js");

/// GET /
///
/// Serves the watch-list page
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /reports
///
/// Serves the report summary page
pub async fn serve_reports() -> Html<&'static str> {
    Html(REPORTS_HTML)
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /static/reports.js
pub async fn serve_reports_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        REPORTS_JS,
    )
        .into_response()
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_index))
        .route("/reports", get(serve_reports))
        .route("/static/app.js", get(serve_app_js))
        .route("/static/reports.js", get(serve_reports_js))
}
