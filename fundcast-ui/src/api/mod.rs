//! HTTP API handlers for fundcast-ui

pub mod funds;
pub mod health;
pub mod podcasts;
pub mod reports;
pub mod sse;
pub mod ui;

pub use funds::fund_routes;
pub use health::health_routes;
pub use podcasts::podcast_routes;
pub use reports::report_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
