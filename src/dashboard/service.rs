/// Dashboard service - owns the registry and both periodic tasks
///
/// Built once at startup and shared with the HTTP layer. `start()` spawns
/// the sweeper and refresher; `stop()` cancels them, empties the registry and
/// closes exactly the viewers it removed. Until the next `start()`, viewers
/// arriving after `stop()` are closed without being registered.
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::broadcast::{BroadcastOutcome, Broadcaster};
use super::message::{Topic, Update, EVENT_SNAPSHOT};
use super::metrics::{DashboardMetrics, DashboardMetricsSnapshot};
use super::notifier::EventNotifier;
use super::provider::MetricsProvider;
use super::refresher::{RefreshOutcome, Refresher};
use super::registry::{Connection, ConnectionId, ConnectionRegistry};
use super::sweeper::LivenessSweeper;
use super::transport::Transport;
use crate::config::DashboardConfig;
use crate::logger::{self, LogTag};

/// Response body of the stats endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_connections: usize,
    pub topic_subscribers: BTreeMap<String, usize>,
    pub active: bool,
}

struct Tasks {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

pub struct DashboardService {
    config: DashboardConfig,
    registry: Arc<ConnectionRegistry>,
    provider: Arc<dyn MetricsProvider>,
    metrics: Arc<DashboardMetrics>,
    broadcaster: Broadcaster,
    refresher: Arc<Refresher>,
    notifier: EventNotifier,
    tasks: Mutex<Option<Tasks>>,
    active: AtomicBool,
    stopped: AtomicBool,
}

impl DashboardService {
    pub fn new(config: DashboardConfig, provider: Arc<dyn MetricsProvider>) -> Arc<Self> {
        let registry = ConnectionRegistry::new();
        let metrics = DashboardMetrics::new();
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&metrics));
        let refresher = Refresher::new(
            Arc::clone(&registry),
            Arc::clone(&provider),
            broadcaster.clone(),
            Arc::clone(&metrics),
        );
        let notifier = EventNotifier::new(broadcaster.clone(), Arc::clone(&refresher));

        Arc::new(Self {
            config,
            registry,
            provider,
            metrics,
            broadcaster,
            refresher,
            notifier,
            tasks: Mutex::new(None),
            active: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Spawn the sweeper and refresher. A second call is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            logger::warning(LogTag::Dashboard, "Dashboard service already started");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);

        let sweeper = LivenessSweeper::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
            self.config.stale_after(),
            self.config.close_timeout(),
        );
        let handles = vec![
            sweeper.spawn(self.config.sweep_interval(), shutdown_rx.clone()),
            self.refresher
                .spawn(self.config.refresh_interval(), shutdown_rx),
        ];

        *tasks = Some(Tasks { shutdown, handles });
        self.stopped.store(false, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);

        logger::info(
            LogTag::Dashboard,
            &format!(
                "Dashboard service started (sweep={}s, stale={}s, refresh={}s)",
                self.config.sweep_interval_secs,
                self.config.stale_after_secs,
                self.config.refresh_interval_secs
            ),
        );
    }

    /// Cancel timers, clear the registry, close every viewer it held.
    ///
    /// Errors along the way are logged and swallowed.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let tasks = self.tasks.lock().take();

        if let Some(Tasks { shutdown, handles }) = tasks {
            let _ = shutdown.send(true);
            let stop_timeout = self.config.stop_timeout();

            for mut handle in handles {
                if tokio::time::timeout(stop_timeout, &mut handle).await.is_err() {
                    logger::warning(
                        LogTag::Dashboard,
                        "Periodic task did not stop in time, aborting",
                    );
                    handle.abort();
                }
            }
        }

        // drain before closing so every removed viewer is also closed
        let drained = self.registry.drain();
        let close_timeout = self.config.close_timeout();
        let closes = drained.iter().map(|connection| async move {
            if tokio::time::timeout(close_timeout, connection.transport().close())
                .await
                .is_err()
            {
                logger::debug(
                    LogTag::Dashboard,
                    &format!("Close of {} timed out during shutdown", connection.id()),
                );
            }
        });
        join_all(closes).await;
        self.active.store(false, Ordering::SeqCst);

        logger::info(
            LogTag::Dashboard,
            &format!(
                "Dashboard service stopped ({} viewer(s) closed)",
                drained.len()
            ),
        );
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn reject(&self, id: ConnectionId, transport: &dyn Transport) {
        logger::debug(
            LogTag::Dashboard,
            &format!("Viewer {} refused, dashboard service is stopped", id),
        );
        if tokio::time::timeout(self.config.close_timeout(), transport.close())
            .await
            .is_err()
        {
            logger::debug(
                LogTag::Dashboard,
                &format!("Close of refused viewer {} timed out", id),
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    // ========================================================================
    // CONNECTIONS
    // ========================================================================

    /// Register a viewer and push it the current metrics and health.
    ///
    /// If the provider fails the viewer stays registered and gets its first
    /// numbers from the next refresh. After `stop()` the transport is closed
    /// and never registered.
    pub async fn connect(&self, transport: Arc<dyn Transport>) -> ConnectionId {
        let id = ConnectionId::new();
        if self.is_stopped() {
            self.reject(id, transport.as_ref()).await;
            return id;
        }

        self.registry
            .register(Connection::new(id, Arc::clone(&transport)));
        // stop() may have drained between the check and the insert
        if self.is_stopped() {
            self.registry.unregister(id);
            self.reject(id, transport.as_ref()).await;
            return id;
        }
        self.metrics.connection_opened();

        logger::debug(
            LogTag::Dashboard,
            &format!("Viewer {} connected (total={})", id, self.registry.len()),
        );

        match self.provider.snapshot().await {
            Ok(_) if !self.registry.contains(id) => {}
            Ok(snapshot) => {
                let health = snapshot.health.clone();
                for update in [
                    Update::metrics(EVENT_SNAPSHOT, snapshot),
                    Update::health(EVENT_SNAPSHOT, health),
                ] {
                    self.push_to(transport.as_ref(), id, &update);
                }
            }
            Err(e) => {
                logger::warning(
                    LogTag::Dashboard,
                    &format!("Initial snapshot for viewer {} unavailable: {}", id, e),
                );
            }
        }

        id
    }

    fn push_to(&self, transport: &dyn Transport, id: ConnectionId, update: &Update) {
        let frame = match update.to_server_message() {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                logger::error(
                    LogTag::Dashboard,
                    &format!("Failed to serialize {} update: {}", update.kind(), e),
                );
                return;
            }
        };

        match transport.push(frame) {
            Ok(()) => self.metrics.message_sent(),
            Err(e) => {
                self.metrics.message_failed();
                logger::debug(
                    LogTag::Dashboard,
                    &format!("Initial push to {} failed: {}", id, e),
                );
            }
        }
    }

    /// Unregister a viewer. Unknown ids are ignored.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.registry.unregister(id).is_some() {
            self.metrics.connection_closed();
            logger::debug(
                LogTag::Dashboard,
                &format!("Viewer {} disconnected (total={})", id, self.registry.len()),
            );
        }
    }

    pub fn subscribe(&self, id: ConnectionId, topics: &[Topic]) -> bool {
        self.registry.subscribe(id, topics)
    }

    pub fn unsubscribe(&self, id: ConnectionId, topics: &[Topic]) -> bool {
        self.registry.unsubscribe(id, topics)
    }

    /// Refresh liveness for `id`. Any inbound traffic counts.
    pub fn heartbeat(&self, id: ConnectionId) -> bool {
        self.registry.touch(id)
    }

    // ========================================================================
    // UPDATES
    // ========================================================================

    pub fn notifier(&self) -> EventNotifier {
        self.notifier.clone()
    }

    pub fn broadcast(&self, update: &Update) -> BroadcastOutcome {
        self.broadcaster.broadcast(update)
    }

    /// One refresher tick outside the timer
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.refresher.tick(super::message::EVENT_REFRESH).await
    }

    /// One sweep pass outside the timer
    pub async fn sweep_now(&self) -> usize {
        LivenessSweeper::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
            self.config.stale_after(),
            self.config.close_timeout(),
        )
        .sweep()
        .await
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total_connections: self.registry.len(),
            topic_subscribers: self.registry.topic_counts(),
            active: self.is_active(),
        }
    }

    pub fn metrics(&self) -> DashboardMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}
