/// Metrics provider seam
///
/// The dashboard only calls `snapshot()` and forwards the result; how the
/// numbers are computed (SQL aggregation, remote API) is up to the
/// implementation.
use async_trait::async_trait;

use super::payloads::MetricsSnapshot;
use crate::errors::DashboardError;

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Current aggregate values. May fail transiently.
    async fn snapshot(&self) -> Result<MetricsSnapshot, DashboardError>;

    /// Short name for log lines
    fn name(&self) -> &'static str {
        "metrics"
    }
}
