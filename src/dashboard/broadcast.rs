/// Broadcast engine - fans an update out to interested viewers
///
/// Delivery is fire-and-forget: a failed push is counted and logged at
/// debug level, never returned to the caller, and the connection is left for
/// the liveness sweeper.
use std::sync::Arc;

use super::message::Update;
use super::metrics::DashboardMetrics;
use super::registry::ConnectionRegistry;
use crate::logger::{self, LogTag};

/// Result of one broadcast call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<DashboardMetrics>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<DashboardMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Push `update` to every connection subscribed to its kind or to
    /// `overview`. Pushes complete before this returns, so per-connection
    /// order follows call order.
    pub fn broadcast(&self, update: &Update) -> BroadcastOutcome {
        let kind = update.kind();
        let targets: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|connection| connection.wants(kind))
            .collect();

        if targets.is_empty() {
            return BroadcastOutcome::default();
        }

        let frame = match update.to_server_message() {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                logger::error(
                    LogTag::Dashboard,
                    &format!("Failed to serialize {} update: {}", kind, e),
                );
                return BroadcastOutcome {
                    matched: targets.len(),
                    ..BroadcastOutcome::default()
                };
            }
        };

        let mut outcome = BroadcastOutcome {
            matched: targets.len(),
            ..BroadcastOutcome::default()
        };

        for connection in &targets {
            match connection.transport().push(Arc::clone(&frame)) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed += 1;
                    logger::debug(
                        LogTag::Dashboard,
                        &format!("Push to {} failed: {}", connection.id(), e),
                    );
                }
            }
        }

        self.metrics
            .update_broadcast(outcome.delivered as u64, outcome.failed as u64);

        logger::debug(
            LogTag::Dashboard,
            &format!(
                "Broadcast {}/{} (matched={}, sent={}, failed={})",
                kind, update.event, outcome.matched, outcome.delivered, outcome.failed
            ),
        );

        outcome
    }
}
