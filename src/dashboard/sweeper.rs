/// Liveness sweeper - evicts viewers that vanished without a clean close
///
/// Each stale connection is closed with its own timeout and all closes run
/// concurrently, so one hung transport cannot hold up the rest.
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::metrics::DashboardMetrics;
use super::registry::{Connection, ConnectionRegistry};
use crate::logger::{self, LogTag};

pub struct LivenessSweeper {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<DashboardMetrics>,
    stale_after: Duration,
    close_timeout: Duration,
}

impl LivenessSweeper {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        metrics: Arc<DashboardMetrics>,
        stale_after: Duration,
        close_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            metrics,
            stale_after,
            close_timeout,
        }
    }

    /// One sweep pass. Returns the number of evicted connections.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let stale: Vec<Connection> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|connection| now.duration_since(connection.last_seen()) > self.stale_after)
            .collect();

        if stale.is_empty() {
            return 0;
        }

        let evictions = stale.into_iter().map(|connection| self.evict(connection));
        let evicted = join_all(evictions).await.len();

        logger::info(
            LogTag::Dashboard,
            &format!(
                "Liveness sweep evicted {} stale viewer(s) (remaining={})",
                evicted,
                self.registry.len()
            ),
        );
        evicted
    }

    async fn evict(&self, connection: Connection) {
        let id = connection.id();
        let idle = connection.last_seen().elapsed();

        if tokio::time::timeout(self.close_timeout, connection.transport().close())
            .await
            .is_err()
        {
            logger::warning(
                LogTag::Dashboard,
                &format!(
                    "Close of stale viewer {} timed out after {}ms",
                    id,
                    self.close_timeout.as_millis()
                ),
            );
        }

        if self.registry.unregister(id).is_some() {
            self.metrics.connection_evicted();
        }
        logger::debug(
            LogTag::Dashboard,
            &format!("Evicted viewer {} (idle {}s)", id, idle.as_secs()),
        );
    }

    /// Run `sweep` every `period` until `shutdown` flips to true
    pub fn spawn(self, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            logger::debug(LogTag::Dashboard, "Liveness sweeper stopped");
        })
    }
}
