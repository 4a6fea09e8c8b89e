//! Event types for the Fundcast event system
//!
//! Provides the shared event definitions and EventBus used to feed the
//! SSE stream consumed by connected browser pages.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Fundcast event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FundcastEvent {
    /// Batch report run started
    ///
    /// Triggers:
    /// - SSE: Show batch progress UI
    BatchRunStarted {
        /// Batch run UUID
        run_id: Uuid,
        /// Report quarter being fetched (e.g. "2024Q4")
        quarter: String,
        /// Number of funds in the run
        total_funds: usize,
        /// When the run started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Batch report run progress update
    ///
    /// Emitted once per completed chunk.
    ///
    /// Triggers:
    /// - SSE: Update progress bar and current-fund label
    BatchRunProgress {
        /// Batch run UUID
        run_id: Uuid,
        /// Report quarter being fetched
        quarter: String,
        /// Funds processed so far
        current: usize,
        /// Total funds in the run
        total: usize,
        /// Progress percentage (0.0 - 100.0)
        percentage: f64,
        /// Most recently processed fund name
        current_fund: Option<String>,
        /// When progress updated
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Batch report run completed (all chunks processed, results persisted)
    ///
    /// Triggers:
    /// - SSE: Navigate to the summary view
    BatchRunCompleted {
        /// Batch run UUID
        run_id: Uuid,
        /// Report quarter fetched
        quarter: String,
        /// Items fetched successfully
        succeeded: usize,
        /// Items recorded as failures
        failed: usize,
        /// Run duration in seconds
        duration_seconds: u64,
        /// When the run completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Batch report run cancelled by user (nothing persisted)
    ///
    /// Triggers:
    /// - SSE: Dismiss batch progress UI
    BatchRunCancelled {
        /// Batch run UUID
        run_id: Uuid,
        /// Report quarter that was being fetched
        quarter: String,
        /// Items that had completed before cancellation
        completed_items: usize,
        /// When the run was cancelled
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The device's watch-list changed (fund added or removed)
    ///
    /// Triggers:
    /// - SSE: Refresh fund cards in other connected tabs
    WatchListChanged {
        /// Device identifier owning the watch-list
        device_id: String,
        /// When the list changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FundcastEvent {
    /// Get event type as string for SSE event naming and filtering
    pub fn event_type(&self) -> &str {
        match self {
            FundcastEvent::BatchRunStarted { .. } => "BatchRunStarted",
            FundcastEvent::BatchRunProgress { .. } => "BatchRunProgress",
            FundcastEvent::BatchRunCompleted { .. } => "BatchRunCompleted",
            FundcastEvent::BatchRunCancelled { .. } => "BatchRunCancelled",
            FundcastEvent::WatchListChanged { .. } => "WatchListChanged",
        }
    }
}

/// Broadcast bus carrying events to every connected SSE stream
///
/// A thin wrapper over `tokio::sync::broadcast`: publishing never blocks
/// on a slow page, any number of streams may listen, and a dropped
/// stream unsubscribes itself.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FundcastEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Open a receiver for everything emitted from this point on;
    /// earlier events are not replayed
    pub fn subscribe(&self) -> broadcast::Receiver<FundcastEvent> {
        self.tx.subscribe()
    }

    /// Emit to all current subscribers, reporting how many there were
    pub fn emit(
        &self,
        event: FundcastEvent,
    ) -> Result<usize, broadcast::error::SendError<FundcastEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone listens
    ///
    /// Batch progress is lossy by design: a run proceeds the same whether
    /// or not a page is connected to watch it.
    pub fn emit_lossy(&self, event: FundcastEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
