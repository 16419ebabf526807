//! Stemflow Daemon - Main Entry Point
//!
//! Composition root: wires the separator, workspace store, publisher,
//! and registry into a supervisor and serves the HTTP API.

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stemflow_api_http::{handler, AppState, HttpServer, HttpServerConfig};
use stemflow_core::application::{shutdown_channel, JobRegistry, JobSupervisor};
use stemflow_core::port::id_provider::UuidProvider;
use stemflow_core::port::time_provider::SystemTimeProvider;
use stemflow_infra_system::{DemucsSeparator, FsStemPublisher, FsWorkspaceStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_PUBLIC_DIR: &str = "~/.stemflow/stems";
const DEFAULT_UPLOAD_DIR: &str = "~/.stemflow/uploads";
const DEFAULT_DEMUCS_BIN: &str = "demucs";
const DEFAULT_RETENTION_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("STEMFLOW_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("stemflow=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Stemflow v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let http_port: u16 = std::env::var("STEMFLOW_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    let public_dir = std::env::var("STEMFLOW_PUBLIC_DIR")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_PUBLIC_DIR).into_owned());
    let upload_dir = std::env::var("STEMFLOW_UPLOAD_DIR")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_UPLOAD_DIR).into_owned());
    let demucs_bin =
        std::env::var("STEMFLOW_DEMUCS_BIN").unwrap_or_else(|_| DEFAULT_DEMUCS_BIN.to_string());
    let retention_secs: u64 = std::env::var("STEMFLOW_RETENTION_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_SECS);

    info!(
        public_dir = %public_dir,
        upload_dir = %upload_dir,
        demucs_bin = %demucs_bin,
        retention_secs,
        "Configuration loaded"
    );

    tokio::fs::create_dir_all(&public_dir).await?;
    tokio::fs::create_dir_all(&upload_dir).await?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);

    let separator = Arc::new(DemucsSeparator::new(demucs_bin, time_provider.clone()));
    let workspaces = Arc::new(FsWorkspaceStore::system_temp());
    let publisher = Arc::new(FsStemPublisher::new(&public_dir, time_provider.clone()));
    let registry = Arc::new(JobRegistry::new());

    let supervisor = Arc::new(JobSupervisor::new(
        separator,
        workspaces,
        publisher,
        registry.clone(),
        time_provider.clone(),
        id_provider,
        Duration::from_secs(retention_secs),
    ));

    // 4. Start HTTP server
    let state = AppState::new(supervisor, registry, &upload_dir);
    let router = handler::router(state, &public_dir);

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let http_server = HttpServer::new(HttpServerConfig {
        port: http_port,
        ..Default::default()
    });
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http_server.start(router, shutdown_rx).await {
            tracing::error!(error = %e, "HTTP server failed");
        }
    });

    info!("System ready. Waiting for uploads...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
