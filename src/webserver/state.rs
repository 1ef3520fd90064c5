/// Shared application state passed to all route handlers
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::dashboard::DashboardService;
use crate::store::IncidentStore;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub store: IncidentStore,
    pub startup_time: DateTime<Utc>,
    /// Outbound queue capacity for each viewer connection
    pub client_buffer_size: usize,
}

impl AppState {
    pub fn new(
        dashboard: Arc<DashboardService>,
        store: IncidentStore,
        client_buffer_size: usize,
    ) -> Self {
        Self {
            dashboard,
            store,
            startup_time: Utc::now(),
            client_buffer_size,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
