//! Configuration resolution for fundcast-ui
//!
//! Listen port and backend URL follow the module-wide priority order
//! (CLI > environment > TOML > compiled default). The device identifier
//! is resolved once at startup and injected into application state so
//! nothing downstream reaches for ambient global state.

use fundcast_common::config::TomlConfig;
use fundcast_common::db::settings::{get_setting, set_setting, KEY_DEVICE_ID};
use fundcast_common::Result;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

/// Default listen port for the module
pub const DEFAULT_PORT: u16 = 5730;

/// Default backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Environment variable naming the backend base URL
pub const BACKEND_URL_ENV: &str = "FUNDCAST_BACKEND_URL";

/// Resolve the backend base URL (CLI > env > TOML > default)
pub fn resolve_backend_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    if let Some(url) = cli_arg {
        return url.to_string();
    }

    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        if !url.is_empty() {
            return url;
        }
    }

    if let Some(url) = &toml_config.backend_url {
        return url.clone();
    }

    DEFAULT_BACKEND_URL.to_string()
}

/// Resolve the listen port (CLI > TOML > default; the env tier is
/// handled by clap's `env` attribute on the CLI argument)
pub fn resolve_listen_port(cli_arg: Option<u16>, toml_config: &TomlConfig) -> u16 {
    cli_arg
        .or(toml_config.listen_port)
        .unwrap_or(DEFAULT_PORT)
}

/// Load the persisted device identifier, generating and persisting one
/// on first start
///
/// The identifier is opaque: `user_` plus 9 random lowercase
/// alphanumerics, scoping every watch-list call to this installation.
pub async fn resolve_device_id(db: &SqlitePool) -> Result<String> {
    if let Some(id) = get_setting::<String>(db, KEY_DEVICE_ID).await? {
        info!("Device id loaded from settings");
        return Ok(id);
    }

    let id = generate_device_id();
    set_setting(db, KEY_DEVICE_ID, &id).await?;
    info!(device_id = %id, "Generated new device id");

    Ok(id)
}

/// Generate a fresh opaque device identifier
pub fn generate_device_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("user_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundcast_common::db::init_memory_pool;

    #[test]
    fn test_generate_device_id_shape() {
        let id = generate_device_id();

        assert!(id.starts_with("user_"));
        assert_eq!(id.len(), "user_".len() + 9);
        assert!(id["user_".len()..]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_device_id_is_random() {
        // Two draws colliding would mean the generator is broken
        assert_ne!(generate_device_id(), generate_device_id());
    }

    #[tokio::test]
    async fn test_resolve_device_id_generates_once() {
        let pool = init_memory_pool().await.unwrap();

        let first = resolve_device_id(&pool).await.unwrap();
        let second = resolve_device_id(&pool).await.unwrap();

        assert_eq!(first, second, "Device id must be stable across startups");
    }

    #[test]
    fn test_resolve_backend_url_priority() {
        let toml_config = TomlConfig {
            data_folder: None,
            backend_url: Some("http://toml:8000".to_string()),
            listen_port: None,
        };

        assert_eq!(
            resolve_backend_url(Some("http://cli:8000"), &toml_config),
            "http://cli:8000"
        );
        // Without CLI and env, TOML wins over the compiled default
        std::env::remove_var(BACKEND_URL_ENV);
        assert_eq!(resolve_backend_url(None, &toml_config), "http://toml:8000");
        assert_eq!(
            resolve_backend_url(None, &TomlConfig::default()),
            DEFAULT_BACKEND_URL
        );
    }

    #[test]
    fn test_resolve_listen_port_priority() {
        let toml_config = TomlConfig {
            data_folder: None,
            backend_url: None,
            listen_port: Some(6000),
        };

        assert_eq!(resolve_listen_port(Some(7000), &toml_config), 7000);
        assert_eq!(resolve_listen_port(None, &toml_config), 6000);
        assert_eq!(resolve_listen_port(None, &TomlConfig::default()), DEFAULT_PORT);
    }
}
