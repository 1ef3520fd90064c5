/// Service wiring and lifecycle
///
/// Builds the store, metrics provider, dashboard service and webserver from a
/// validated configuration, runs until a shutdown signal arrives, then stops
/// the dashboard before letting the webserver drain.
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::logger::{self, LogTag};
use crate::store::{IncidentStore, SqliteMetricsProvider};
use crate::webserver::{self, AppState};

pub async fn run(config: Config) -> Result<()> {
    let store = IncidentStore::open(Path::new(&config.store.path))
        .with_context(|| format!("Failed to open incident store at {}", config.store.path))?;

    let provider = Arc::new(SqliteMetricsProvider::new(
        store.clone(),
        config.store.trend_hours,
    ));
    let dashboard = DashboardService::new(config.dashboard.clone(), provider);
    dashboard.start();

    let state = Arc::new(AppState::new(
        Arc::clone(&dashboard),
        store,
        config.dashboard.client_buffer_size,
    ));

    // viewers are closed before the server drains, otherwise open sockets
    // would hold graceful shutdown forever
    let stopping = Arc::clone(&dashboard);
    let shutdown = async move {
        wait_for_shutdown_signal().await;
        stopping.stop().await;
    };

    let served = webserver::serve(state, &config.webserver, shutdown).await;

    if dashboard.is_active() {
        dashboard.stop().await;
    }

    served?;
    logger::info(LogTag::System, "incident-relay stopped");
    Ok(())
}

/// Wait for SIGINT/SIGTERM (Ctrl+C elsewhere).
///
/// If the handlers cannot be installed this never resolves; the process is
/// then only stoppable by force.
async fn wait_for_shutdown_signal() {
    match shutdown_signal().await {
        Ok(name) => {
            logger::warning(
                LogTag::System,
                &format!(
                    "Shutdown signal received ({}). Press Ctrl+C again to force kill.",
                    name
                ),
            );
        }
        Err(e) => {
            logger::error(
                LogTag::System,
                &format!("Failed to install signal handlers: {:#}", e),
            );
            std::future::pending::<()>().await;
        }
    }

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::error(LogTag::System, "Second Ctrl+C detected, forcing exit");
            logger::flush();
            // conventional exit code for SIGINT
            std::process::exit(130);
        }
    });
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to bind SIGINT")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to bind SIGTERM")?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    Ok("CTRL_C")
}
