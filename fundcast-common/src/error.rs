//! Shared error type for the fundcast crates

use thiserror::Error;

/// Result alias used by the fundcast crates
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared layers: local persistence, configuration
/// resolution, and serialization of stored values
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem access failed (data folder, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration value missing or unparseable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored JSON value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
