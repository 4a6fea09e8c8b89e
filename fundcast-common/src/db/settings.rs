//! Key/value accessors for the settings table
//!
//! This table is the module's stand-in for browser local storage: the
//! device identifier and the last batch run live here under fixed keys.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Fixed settings key for the device identifier
pub const KEY_DEVICE_ID: &str = "device_id";

/// Fixed settings key for the last batch run's quarter
pub const KEY_BATCH_REPORTS_QUARTER: &str = "batch_reports_quarter";

/// Fixed settings key for the last batch run's result array (JSON)
pub const KEY_BATCH_REPORTS_DATA: &str = "batch_reports_data";

/// Read a setting, parsed into the requested type; None when unset
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Write a setting, replacing any previous value for the key
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Remove a setting if present
pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(())
}
