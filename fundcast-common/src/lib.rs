//! # Fundcast Common Library
//!
//! Shared code for the Fundcast browser-facing module including:
//! - Common error type
//! - Event types (FundcastEvent enum) and EventBus
//! - Configuration loading and data folder resolution
//! - SQLite bootstrap and settings accessors

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
