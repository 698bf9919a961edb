//! Drainage Monitor - flood-risk scoring service for permeable drainage sites
//!
//! Recomputes the flood-risk dashboard on a fixed refresh interval and serves
//! it as JSON under `/api/v1`.
//!
//! # Usage
//!
//! ```bash
//! # Synthetic demo data
//! cargo run --release
//!
//! # Replay an operator dataset
//! ./drainage-monitor --csv data/feed.csv
//!
//! # Reproducible demo without the injected rain spike
//! ./drainage-monitor --seed 7 --no-spike
//! ```
//!
//! # Environment Variables
//!
//! - `DRAINAGE_CONFIG`: Path to the TOML config file
//! - `DRAINAGE_ADDR`: HTTP bind address (overrides `[server] addr`)
//! - `DRAINAGE_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use drainage_monitor::acquisition::{CsvFileSource, ReadingSource, SyntheticSource};
use drainage_monitor::api::{create_app, DashboardState};
use drainage_monitor::config::{self, ConfigHandle, ConfigOverrides, MonitorConfig};
use drainage_monitor::pipeline::processing_loop::RefreshLoop;
use drainage_monitor::pipeline::AppState;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "drainage-monitor")]
#[command(about = "Flood & drainage risk monitoring service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long, env = "DRAINAGE_ADDR", value_name = "HOST:PORT")]
    addr: Option<String>,

    /// CSV dataset with timestamp, rain_mm_per_hr, drain_flow_Lps, tank_fill_pct
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Seed for reproducible synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the injected demo rain spike
    #[arg(long)]
    no_spike: bool,

    /// Config file (skips the DRAINAGE_CONFIG / ./drainage_config.toml search)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl CliArgs {
    /// Command-line values that stay pinned across config reloads.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            addr: self.addr.clone(),
            csv_path: self.csv.clone(),
            seed: self.seed,
            disable_demo_spike: self.no_spike,
        }
    }
}

// ============================================================================
// Task Supervision
// ============================================================================

/// Identifies which supervised task completed or failed.
#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    RefreshLoop,
    ConfigWatcher,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::RefreshLoop => write!(f, "RefreshLoop"),
            TaskName::ConfigWatcher => write!(f, "ConfigWatcher"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Wait for all tasks, cancelling everything if one fails.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    loop {
        match task_set.join_next().await {
            Some(Ok(Ok(task_name))) => {
                info!("Supervisor: task {} completed", task_name);
            }
            Some(Ok(Err(e))) => {
                error!("Supervisor: task failed: {}", e);
                cancel_token.cancel();
                return Err(e);
            }
            Some(Err(e)) => {
                error!("Supervisor: task panicked: {}", e);
                cancel_token.cancel();
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
            None => break,
        }
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let (mut monitor_config, config_path) = match args.config {
        Some(ref path) => (
            MonitorConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            Some(path.clone()),
        ),
        None => (MonitorConfig::load(), config::locate_config_file()),
    };
    let overrides = args.overrides();
    overrides.apply(&mut monitor_config);
    monitor_config.validate().context("Invalid configuration")?;

    let server_addr = monitor_config.server.addr.clone();
    info!(
        site = %monitor_config.site.name,
        window_readings = monitor_config.window_size(),
        refresh_secs = monitor_config.dashboard.refresh_interval_secs,
        "Drainage monitor starting"
    );

    let source: Box<dyn ReadingSource> = match monitor_config.ingest.csv_path {
        Some(ref path) => {
            info!(path = %path.display(), "Input: CSV dataset");
            Box::new(CsvFileSource::new(path.clone()))
        }
        None => {
            info!(
                seed = ?monitor_config.ingest.seed,
                demo_spike = monitor_config.ingest.demo_spike,
                "Input: synthetic readings"
            );
            Box::new(SyntheticSource::new(monitor_config.synthetic_config()))
        }
    };

    let app_state = Arc::new(RwLock::new(AppState::new(monitor_config.site.name.clone())));
    let config_handle = ConfigHandle::with_overrides(monitor_config, overrides);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut dashboard_state = DashboardState::new(Arc::clone(&app_state), config_handle.clone());
    if let Some(ref path) = config_path {
        dashboard_state = dashboard_state.with_config_path(path.clone());
    }
    let app = create_app(dashboard_state);

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("Dashboard API available at http://{}/api/v1", server_addr);

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    let refresh = RefreshLoop::new(
        source,
        Arc::clone(&app_state),
        config_handle.clone(),
        cancel_token.clone(),
    );
    task_set.spawn(async move {
        refresh.run().await;
        Ok(TaskName::RefreshLoop)
    });

    if let Some(path) = config_path {
        let watcher_cancel = cancel_token.clone();
        task_set.spawn(async move {
            config::watcher::run_config_watcher(path, config_handle, watcher_cancel).await;
            Ok(TaskName::ConfigWatcher)
        });
    }

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("Drainage monitor shutdown complete");
    Ok(())
}
