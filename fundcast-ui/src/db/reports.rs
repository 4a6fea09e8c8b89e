//! Persisted batch run results
//!
//! The last completed batch run is stored under two fixed settings keys
//! (quarter and result array), read by the summary view and overwritten
//! by the next completed run. A cancelled run never writes here.

use fundcast_common::db::settings::{
    get_setting, set_setting, KEY_BATCH_REPORTS_DATA, KEY_BATCH_REPORTS_QUARTER,
};
use fundcast_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::ReportFetchResult;

/// The persisted outcome of the last completed batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReports {
    pub quarter: String,
    pub results: Vec<ReportFetchResult>,
}

impl StoredReports {
    /// Count of successful entries
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Count of failed entries
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Persist a completed run, replacing any previous one
pub async fn save_last_run(
    db: &SqlitePool,
    quarter: &str,
    results: &[ReportFetchResult],
) -> Result<()> {
    let data = serde_json::to_string(results)?;

    set_setting(db, KEY_BATCH_REPORTS_QUARTER, quarter).await?;
    set_setting(db, KEY_BATCH_REPORTS_DATA, data).await?;

    tracing::debug!(quarter = %quarter, count = results.len(), "Batch results persisted");

    Ok(())
}

/// Load the last completed run, if any
pub async fn load_last_run(db: &SqlitePool) -> Result<Option<StoredReports>> {
    let quarter: Option<String> = get_setting(db, KEY_BATCH_REPORTS_QUARTER).await?;
    let data: Option<String> = get_setting(db, KEY_BATCH_REPORTS_DATA).await?;

    match (quarter, data) {
        (Some(quarter), Some(data)) => {
            let results: Vec<ReportFetchResult> = serde_json::from_str(&data)?;
            Ok(Some(StoredReports { quarter, results }))
        }
        _ => Ok(None),
    }
}
