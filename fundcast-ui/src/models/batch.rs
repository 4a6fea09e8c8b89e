//! Batch report run state
//!
//! A run progresses RUNNING → COMPLETED or RUNNING → CANCELLED, terminal
//! either way; a fresh run always starts a new instance of this state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchState {
    /// Chunks are being scheduled and fetched
    Running,
    /// All chunks processed, results persisted
    Completed,
    /// Cancelled by user, nothing persisted
    Cancelled,
}

/// Outcome of one fund's report-fetch attempt
///
/// Mutable in place as retries succeed: a retry overwrites the entry for
/// its fund code and leaves every other entry untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFetchResult {
    pub fund_code: String,
    pub fund_name: String,
    pub success: bool,
    pub viewpoint: Option<String>,
    pub manager: Option<String>,
    pub error: Option<String>,
}

impl ReportFetchResult {
    /// Successful fetch outcome
    pub fn success(
        fund_code: String,
        fund_name: String,
        viewpoint: Option<String>,
        manager: Option<String>,
    ) -> Self {
        Self {
            fund_code,
            fund_name,
            success: true,
            viewpoint,
            manager,
            error: None,
        }
    }

    /// Failed fetch outcome; the message folds network error, non-2xx
    /// status and timeout into one human-readable string
    pub fn failure(fund_code: String, fund_name: String, error: String) -> Self {
        Self {
            fund_code,
            fund_name,
            success: false,
            viewpoint: None,
            manager: None,
            error: Some(error),
        }
    }
}

/// Progress tracking for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Funds processed so far
    pub current: usize,
    /// Total funds in the run
    pub total: usize,
    /// Percentage complete (0.0 - 100.0)
    pub percentage: f64,
    /// Most recently processed fund name
    pub current_fund: Option<String>,
}

impl BatchProgress {
    fn new(total: usize) -> Self {
        Self {
            current: 0,
            total,
            percentage: 0.0,
            current_fund: None,
        }
    }
}

/// One batch report run (in-memory coordination state)
///
/// Held by the single coordinating task and published to observers as a
/// whole-object snapshot after each chunk; never concurrently active in
/// more than one instance per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Report quarter being fetched (e.g. "2024Q4")
    pub quarter: String,

    /// Current run state
    pub state: BatchState,

    /// Progress tracking
    pub progress: BatchProgress,

    /// Accumulated per-fund outcomes, in input order
    pub results: Vec<ReportFetchResult>,

    /// Run start time
    pub started_at: DateTime<Utc>,

    /// Run end time (if completed/cancelled)
    pub ended_at: Option<DateTime<Utc>>,
}

impl BatchRun {
    /// Create a new running batch run
    pub fn new(quarter: String, total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            quarter,
            state: BatchState::Running,
            progress: BatchProgress::new(total),
            results: Vec::with_capacity(total),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, stamping the end time for terminal states
    pub fn transition_to(&mut self, new_state: BatchState) {
        self.state = new_state;
        match new_state {
            BatchState::Completed | BatchState::Cancelled => {
                self.ended_at = Some(Utc::now());
            }
            BatchState::Running => {}
        }
    }

    /// Update progress after a chunk completes
    pub fn update_progress(&mut self, current: usize, current_fund: Option<String>) {
        self.progress.current = current;
        self.progress.percentage = if self.progress.total > 0 {
            (current as f64 / self.progress.total as f64) * 100.0
        } else {
            0.0
        };
        self.progress.current_fund = current_fund;
    }

    /// Check if the run is terminal (finished)
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, BatchState::Completed | BatchState::Cancelled)
    }

    /// Count of successful outcomes so far
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Count of failed outcomes so far
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
