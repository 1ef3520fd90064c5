use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::dashboard::{DashboardMetricsSnapshot, DashboardStats};
use crate::webserver::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/metrics", get(dashboard_metrics))
}

/// GET /api/health
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/dashboard/stats
async fn dashboard_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    Json(state.dashboard.stats())
}

/// GET /api/dashboard/metrics - broadcast subsystem counters
async fn dashboard_metrics(State(state): State<Arc<AppState>>) -> Json<DashboardMetricsSnapshot> {
    Json(state.dashboard.metrics())
}
