//! Server-Sent Events stream feeding the browser pages
//!
//! Everything the bus carries is page-relevant, so the stream forwards
//! the whole feed: batch run lifecycle plus watch-list changes. Keep-
//! alive comments hold idle connections open across proxies.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use fundcast_common::events::FundcastEvent;

use crate::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Serialize a bus event into a named SSE frame
fn sse_frame(event: &FundcastEvent) -> Option<Event> {
    let name = event.event_type();
    match serde_json::to_string(event) {
        Ok(payload) => Some(Event::default().event(name).data(payload)),
        Err(e) => {
            warn!("SSE: dropping unserializable {} event: {}", name, e);
            None
        }
    }
}

/// GET /api/events
///
/// One long-lived stream per connected page. Progress frames arrive once
/// per completed chunk; a completion frame is the navigation signal.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("SSE client connected");

    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = sse_frame(&event) {
                        yield Ok(frame);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    // The receiver resumes past the gap; the page catches
                    // up on the next snapshot frame
                    warn!("SSE client lagged, {} events skipped", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat"))
}
