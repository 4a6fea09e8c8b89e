//! Configuration loading and data folder resolution
//!
//! Resolution priority for the data folder (and every other configurable
//! value in the module crates):
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "FUNDCAST_DATA_FOLDER";

/// Optional TOML configuration file contents
///
/// Missing file or missing keys never terminate startup; every field
/// falls back to the compiled default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data folder holding the local SQLite database
    pub data_folder: Option<String>,
    /// Base URL of the external fund-research backend
    pub backend_url: Option<String>,
    /// Port the UI module listens on
    pub listen_port: Option<u16>,
}

impl TomlConfig {
    /// Load from the default per-user config location, if present
    pub fn load_default() -> Self {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load {}: {} (using defaults)", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load and parse a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Default configuration file path for the platform
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fundcast").join("config.toml"))
}

/// Resolve the data folder following the 4-tier priority order
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.data_folder {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// OS-dependent default data folder path
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fundcast"))
        .unwrap_or_else(|| PathBuf::from("./fundcast_data"))
}

/// Create the data folder if missing and return the database path inside it
pub fn ensure_data_folder(data_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(data_folder)?;
    Ok(database_path(data_folder))
}

/// Database file location within the data folder
pub fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join("fundcast.db")
}
