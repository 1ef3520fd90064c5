/// Periodic refresher - keeps passive viewers' aggregate metrics current
///
/// Also serves the notifier's out-of-band refreshes. Those are coalesced:
/// while one is in flight, further triggers only request a single rerun, so
/// a burst of incidents costs at most two extra provider calls and the last
/// broadcast still reflects the state after the burst.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::broadcast::{BroadcastOutcome, Broadcaster};
use super::message::{Update, EVENT_REFRESH, EVENT_TRIGGERED_REFRESH};
use super::metrics::DashboardMetrics;
use super::provider::MetricsProvider;
use super::registry::ConnectionRegistry;
use crate::logger::{self, LogTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nobody watching, provider not called
    Skipped,
    Broadcast(BroadcastOutcome),
    /// Provider failed; retried on the next tick
    Failed,
}

pub struct Refresher {
    registry: Arc<ConnectionRegistry>,
    provider: Arc<dyn MetricsProvider>,
    broadcaster: Broadcaster,
    metrics: Arc<DashboardMetrics>,
    forced_in_flight: AtomicBool,
    forced_rerun: AtomicBool,
}

impl Refresher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        provider: Arc<dyn MetricsProvider>,
        broadcaster: Broadcaster,
        metrics: Arc<DashboardMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            provider,
            broadcaster,
            metrics,
            forced_in_flight: AtomicBool::new(false),
            forced_rerun: AtomicBool::new(false),
        })
    }

    /// One refresh: pull metrics and broadcast them, unless nobody is watching
    pub async fn tick(&self, event: &str) -> RefreshOutcome {
        if self.registry.is_empty() {
            self.metrics.refresh_skipped();
            return RefreshOutcome::Skipped;
        }

        match self.provider.snapshot().await {
            Ok(snapshot) => {
                self.metrics.refresh_completed();
                let outcome = self.broadcaster.broadcast(&Update::metrics(event, snapshot));
                RefreshOutcome::Broadcast(outcome)
            }
            Err(e) => {
                self.metrics.refresh_failed();
                logger::warning(
                    LogTag::Metrics,
                    &format!(
                        "Metrics refresh from '{}' failed, skipping tick: {}",
                        self.provider.name(),
                        e
                    ),
                );
                RefreshOutcome::Failed
            }
        }
    }

    /// Request an immediate refresh on a background task.
    ///
    /// Returns without waiting. Must be called inside a tokio runtime;
    /// outside one the request is dropped with a warning.
    pub fn trigger(self: &Arc<Self>) {
        if self.forced_in_flight.swap(true, Ordering::AcqRel) {
            self.forced_rerun.store(true, Ordering::Release);
            self.metrics.refresh_coalesced();
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.forced_in_flight.store(false, Ordering::Release);
                logger::warning(
                    LogTag::Metrics,
                    "Immediate refresh requested outside the runtime, dropped",
                );
                return;
            }
        };

        let this = Arc::clone(self);
        handle.spawn(async move {
            this.run_triggered().await;
        });
    }

    async fn run_triggered(&self) {
        loop {
            self.forced_rerun.store(false, Ordering::Release);
            self.tick(EVENT_TRIGGERED_REFRESH).await;
            self.forced_in_flight.store(false, Ordering::Release);

            if !self.forced_rerun.load(Ordering::Acquire) {
                break;
            }
            // a trigger that raced the flag reset already spawned its own run
            if self.forced_in_flight.swap(true, Ordering::AcqRel) {
                break;
            }
        }
    }

    /// Run `tick` every `period` until `shutdown` flips to true
    pub fn spawn(
        self: &Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        this.tick(EVENT_REFRESH).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            logger::debug(LogTag::Metrics, "Periodic refresher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::message::UpdateKind;
    use crate::dashboard::registry::{Connection, ConnectionId};
    use crate::dashboard::testing::{FakeProvider, RecordingTransport};

    fn refresher(
        registry: &Arc<ConnectionRegistry>,
        provider: &Arc<FakeProvider>,
    ) -> Arc<Refresher> {
        let metrics = DashboardMetrics::new();
        let broadcaster = Broadcaster::new(Arc::clone(registry), Arc::clone(&metrics));
        Refresher::new(
            Arc::clone(registry),
            provider.clone(),
            broadcaster,
            metrics,
        )
    }

    fn viewer(registry: &ConnectionRegistry) -> Arc<RecordingTransport> {
        let transport = RecordingTransport::new();
        registry.register(Connection::new(ConnectionId::new(), transport.clone()));
        transport
    }

    #[tokio::test]
    async fn test_skip_when_nobody_watching() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();

        let outcome = refresher(&registry, &provider).tick(EVENT_REFRESH).await;

        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_tick_broadcasts_metrics() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = viewer(&registry);

        let outcome = refresher(&registry, &provider).tick(EVENT_REFRESH).await;

        assert!(matches!(outcome, RefreshOutcome::Broadcast(o) if o.delivered == 1));
        assert_eq!(transport.kinds(), vec![UpdateKind::Metrics]);
    }

    #[tokio::test]
    async fn test_provider_failure_skips_tick_only() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = viewer(&registry);
        let refresher = refresher(&registry, &provider);

        provider.set_failing(true);
        assert_eq!(refresher.tick(EVENT_REFRESH).await, RefreshOutcome::Failed);
        assert!(transport.kinds().is_empty());

        provider.set_failing(false);
        assert!(matches!(
            refresher.tick(EVENT_REFRESH).await,
            RefreshOutcome::Broadcast(_)
        ));
        assert_eq!(transport.kinds(), vec![UpdateKind::Metrics]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_loop_survives_failures() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::new();
        let transport = viewer(&registry);
        provider.set_failing(true);
        let (tx, rx) = watch::channel(false);

        let handle = refresher(&registry, &provider).spawn(Duration::from_secs(10), rx);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(provider.calls(), 2);
        assert!(transport.kinds().is_empty());

        provider.set_failing(false);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.calls(), 3);
        assert_eq!(transport.kinds(), vec![UpdateKind::Metrics]);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggered_refreshes_coalesce() {
        let registry = ConnectionRegistry::new();
        let provider = FakeProvider::with_delay(Duration::from_millis(100));
        let transport = viewer(&registry);
        let refresher = refresher(&registry, &provider);

        // a burst before the run starts is served by that run
        for _ in 0..5 {
            refresher.trigger();
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.calls(), 1);

        // a burst while a run is in flight costs exactly one rerun
        refresher.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;
        for _ in 0..4 {
            refresher.trigger();
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(provider.calls(), 3);
        assert_eq!(transport.kinds().len(), 3);
    }
}
