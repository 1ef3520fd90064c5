/// Axum webserver lifecycle: bind, serve, graceful shutdown
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::WebserverConfig;
use crate::logger::{self, LogTag};
use crate::webserver::{routes, state::AppState};

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(state: Arc<AppState>, config: &WebserverConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => anyhow::anyhow!(
            "Failed to bind to {}: address already in use (is another incident-relay running?)",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => anyhow::anyhow!(
            "Failed to bind to {}: permission denied, use a port above 1024",
            addr
        ),
        _ => anyhow::anyhow!("Failed to bind to {}: {}", addr, e),
    })?;

    let app = build_app(state, config.cors_permissive);

    logger::info(
        LogTag::Webserver,
        &format!("Listening on http://{} (dashboard socket at /ws)", addr),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webserver error")?;

    logger::info(LogTag::Webserver, "Webserver stopped");
    Ok(())
}

/// Router with all routes and middleware
pub fn build_app(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let app = routes::create_router(state);

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
