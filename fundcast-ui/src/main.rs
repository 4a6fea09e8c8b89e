//! fundcast-ui - Browser-facing module of the fund-research podcast tool
//!
//! Serves the embedded watch-list and report summary pages, proxies the
//! external backend REST API, and coordinates batch report fetches. All
//! business logic (report parsing, summarization, audio synthesis) lives
//! in the backend; this module contains none of it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use fundcast_common::config::{ensure_data_folder, resolve_data_folder, TomlConfig};
use fundcast_common::events::EventBus;
use fundcast_ui::config::{resolve_backend_url, resolve_device_id, resolve_listen_port};
use fundcast_ui::services::BackendClient;
use fundcast_ui::AppState;

/// Command-line arguments for fundcast-ui
#[derive(Parser, Debug)]
#[command(name = "fundcast-ui")]
#[command(about = "Browser-facing module of the fund-research podcast tool")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "FUNDCAST_PORT")]
    port: Option<u16>,

    /// Data folder holding the local database
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Base URL of the fund-research backend
    #[arg(short, long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting fundcast-ui v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let toml_config = TomlConfig::load_default();

    // Step 1: Resolve and create the data folder
    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &toml_config);
    let db_path = ensure_data_folder(&data_folder)?;
    info!("Database: {}", db_path.display());

    // Step 2: Open or create the local database
    let db_pool = fundcast_common::db::init_database_pool(&db_path).await?;

    // Step 3: Resolve device identity (generated and persisted on first start)
    let device_id = resolve_device_id(&db_pool).await?;

    // Step 4: Backend client
    let backend_url = resolve_backend_url(args.backend_url.as_deref(), &toml_config);
    let backend = Arc::new(
        BackendClient::new(&backend_url)
            .map_err(|e| anyhow::anyhow!("Failed to create backend client: {}", e))?,
    );
    info!("Backend: {}", backend_url);

    // Step 5: Event bus feeding the SSE streams
    let event_bus = EventBus::new(100);

    // Create application state and router
    let state = AppState::new(db_pool, event_bus, backend, device_id);
    let app = fundcast_ui::build_router(state);

    // Start server
    let port = resolve_listen_port(args.port, &toml_config);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Watch-list page on http://127.0.0.1:{}/", port);

    axum::serve(listener, app).await?;

    Ok(())
}
