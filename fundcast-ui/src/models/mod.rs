//! Data models for fundcast-ui

mod batch;
mod fund;

pub use batch::{BatchProgress, BatchRun, BatchState, ReportFetchResult};
pub use fund::{
    BatchImportOutcome, FundInfo, FundWatchItem, ImportedFund, PodcastItem, RejectedFund,
    ReportViewpoint, TranscriptItem,
};
