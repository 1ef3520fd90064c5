/// `MetricsProvider` backed by the incident store
///
/// Aggregation is synchronous sqlite work, so it runs on the blocking pool
/// and the dashboard tasks never stall a runtime worker on it.
use async_trait::async_trait;
use chrono::Utc;

use super::IncidentStore;
use crate::dashboard::payloads::MetricsSnapshot;
use crate::dashboard::provider::MetricsProvider;
use crate::errors::DashboardError;

pub struct SqliteMetricsProvider {
    store: IncidentStore,
    trend_hours: u32,
}

impl SqliteMetricsProvider {
    pub fn new(store: IncidentStore, trend_hours: u32) -> Self {
        Self { store, trend_hours }
    }
}

#[async_trait]
impl MetricsProvider for SqliteMetricsProvider {
    async fn snapshot(&self) -> Result<MetricsSnapshot, DashboardError> {
        let trend_hours = self.trend_hours;
        let snapshot = self
            .store
            .blocking(move |store| store.compute_snapshot(trend_hours, Utc::now()))
            .await?;

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
