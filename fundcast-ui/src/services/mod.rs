//! Service layer for fundcast-ui

pub mod backend;
pub mod batch_fetcher;

pub use backend::{BackendClient, BackendError, REPORT_TIMEOUT_SECS};
pub use batch_fetcher::{BatchFetcher, CHUNK_DELAY, CHUNK_SIZE};
