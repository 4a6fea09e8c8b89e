//! Batch report fetch coordinator
//!
//! Fetches each watched fund's quarterly report viewpoint from the
//! backend, chunk by chunk. Within a chunk requests run concurrently and
//! the coordinator suspends until all have settled; across chunks
//! execution is strictly sequential with a fixed delay gate. The
//! cancellation token is consulted only at chunk boundaries: in-flight
//! requests always settle, only chunk scheduling stops.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use fundcast_common::events::{EventBus, FundcastEvent};
use fundcast_common::Result;

use crate::db::reports::{self, StoredReports};
use crate::models::{BatchRun, BatchState, FundWatchItem, ReportFetchResult};
use crate::services::BackendClient;
use crate::RunRegistry;

/// Funds fetched concurrently per chunk
pub const CHUNK_SIZE: usize = 3;

/// Delay between chunks. A fixed courtesy to the backend, not derived
/// from any server-provided backpressure signal.
pub const CHUNK_DELAY: Duration = Duration::from_secs(2);

/// Batch report fetch coordinator
pub struct BatchFetcher {
    backend: Arc<BackendClient>,
    db: SqlitePool,
    event_bus: EventBus,
    runs: RunRegistry,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl BatchFetcher {
    pub fn new(
        backend: Arc<BackendClient>,
        db: SqlitePool,
        event_bus: EventBus,
        runs: RunRegistry,
    ) -> Self {
        Self {
            backend,
            db,
            event_bus,
            runs,
            chunk_size: CHUNK_SIZE,
            chunk_delay: CHUNK_DELAY,
        }
    }

    /// Override the inter-chunk delay (tests use a short gate)
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Execute one batch run to a terminal state
    ///
    /// On normal completion the result set is persisted for the summary
    /// view and a completion event signals navigation. On cancellation
    /// nothing is persisted and no completion event fires.
    pub async fn execute(
        &self,
        mut run: BatchRun,
        funds: Vec<FundWatchItem>,
        cancel: CancellationToken,
    ) -> Result<BatchRun> {
        let start_time = std::time::Instant::now();
        let total = funds.len();

        tracing::info!(
            run_id = %run.run_id,
            quarter = %run.quarter,
            total,
            "Starting batch report run"
        );

        self.publish(&run).await;
        self.event_bus.emit_lossy(FundcastEvent::BatchRunStarted {
            run_id: run.run_id,
            quarter: run.quarter.clone(),
            total_funds: total,
            timestamp: Utc::now(),
        });

        let chunks: Vec<&[FundWatchItem]> = funds.chunks(self.chunk_size).collect();
        let chunk_count = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            // Checked before each chunk only; a cancel request mid-chunk
            // lets the chunk settle
            if cancel.is_cancelled() {
                return self.finish_cancelled(run).await;
            }

            let outcomes =
                future::join_all(chunk.iter().map(|fund| self.fetch_one(fund, &run.quarter)))
                    .await;

            // Whole-chunk append: result order follows input order, not
            // completion order
            let last_fund = chunk.last().map(|f| f.name.clone());
            run.results.extend(outcomes);
            let current = run.results.len();
            run.update_progress(current, last_fund.clone());
            self.publish(&run).await;
            self.event_bus.emit_lossy(FundcastEvent::BatchRunProgress {
                run_id: run.run_id,
                quarter: run.quarter.clone(),
                current,
                total,
                percentage: run.progress.percentage,
                current_fund: last_fund,
                timestamp: Utc::now(),
            });

            if index + 1 < chunk_count && !cancel.is_cancelled() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        // A cancel that lands during the final chunk still discards the run
        if cancel.is_cancelled() {
            return self.finish_cancelled(run).await;
        }

        reports::save_last_run(&self.db, &run.quarter, &run.results).await?;

        run.transition_to(BatchState::Completed);
        run.update_progress(run.results.len(), None);
        self.publish(&run).await;

        let duration_seconds = start_time.elapsed().as_secs();
        tracing::info!(
            run_id = %run.run_id,
            succeeded = run.succeeded(),
            failed = run.failed(),
            duration_seconds,
            "Batch report run completed"
        );

        self.event_bus.emit_lossy(FundcastEvent::BatchRunCompleted {
            run_id: run.run_id,
            quarter: run.quarter.clone(),
            succeeded: run.succeeded(),
            failed: run.failed(),
            duration_seconds,
            timestamp: Utc::now(),
        });

        Ok(run)
    }

    /// Retry the named fund codes against the persisted result set
    ///
    /// An empty code list retries every failed entry. Updated outcomes
    /// are spliced in by fund code; entries not named stay untouched.
    /// Returns None when no run has been persisted yet.
    pub async fn retry(&self, codes: &[String]) -> Result<Option<StoredReports>> {
        let Some(mut stored) = reports::load_last_run(&self.db).await? else {
            return Ok(None);
        };

        let targets: Vec<String> = if codes.is_empty() {
            stored
                .results
                .iter()
                .filter(|r| !r.success)
                .map(|r| r.fund_code.clone())
                .collect()
        } else {
            codes.to_vec()
        };

        tracing::info!(
            quarter = %stored.quarter,
            count = targets.len(),
            "Retrying report fetches"
        );

        for code in &targets {
            let Some(index) = stored.results.iter().position(|r| &r.fund_code == code) else {
                tracing::warn!(fund = %code, "Retry requested for unknown fund code, skipping");
                continue;
            };

            let fund_name = stored.results[index].fund_name.clone();
            stored.results[index] = match self.backend.report_viewpoint(code, &stored.quarter).await
            {
                Ok(vp) => ReportFetchResult::success(
                    code.clone(),
                    fund_name,
                    vp.viewpoint,
                    vp.fund_info.and_then(|info| info.manager),
                ),
                Err(e) => {
                    tracing::warn!(fund = %code, error = %e, "Retry fetch failed");
                    ReportFetchResult::failure(code.clone(), fund_name, e.to_string())
                }
            };
        }

        reports::save_last_run(&self.db, &stored.quarter, &stored.results).await?;

        Ok(Some(stored))
    }

    /// Fetch one fund's viewpoint, folding every failure mode into a
    /// per-item outcome so siblings in the chunk are unaffected
    async fn fetch_one(&self, fund: &FundWatchItem, quarter: &str) -> ReportFetchResult {
        match self.backend.report_viewpoint(&fund.code, quarter).await {
            Ok(vp) => {
                tracing::debug!(fund = %fund.code, quarter = %quarter, "Report viewpoint fetched");
                ReportFetchResult::success(
                    fund.code.clone(),
                    fund.name.clone(),
                    vp.viewpoint,
                    vp.fund_info.and_then(|info| info.manager),
                )
            }
            Err(e) => {
                tracing::warn!(fund = %fund.code, quarter = %quarter, error = %e, "Report fetch failed");
                ReportFetchResult::failure(fund.code.clone(), fund.name.clone(), e.to_string())
            }
        }
    }

    /// Terminal path for a cancelled run: completed outcomes are kept in
    /// the snapshot but nothing is persisted
    async fn finish_cancelled(&self, mut run: BatchRun) -> Result<BatchRun> {
        run.transition_to(BatchState::Cancelled);
        self.publish(&run).await;

        tracing::info!(
            run_id = %run.run_id,
            completed_items = run.results.len(),
            "Batch report run cancelled"
        );

        self.event_bus.emit_lossy(FundcastEvent::BatchRunCancelled {
            run_id: run.run_id,
            quarter: run.quarter.clone(),
            completed_items: run.results.len(),
            timestamp: Utc::now(),
        });

        Ok(run)
    }

    /// Replace the registry snapshot for this run (whole-object replace,
    /// so readers never observe a partially updated run)
    async fn publish(&self, run: &BatchRun) {
        self.runs.write().await.insert(run.run_id, run.clone());
    }
}
