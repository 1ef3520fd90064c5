use serde::Serialize;
/// Dashboard counters
///
/// Aggregate, lock-free counters for the broadcast subsystem, exposed
/// through the stats endpoint.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DashboardMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    connections_evicted: AtomicU64,
    updates_broadcast: AtomicU64,
    messages_sent: AtomicU64,
    messages_failed: AtomicU64,
    refreshes_completed: AtomicU64,
    refreshes_skipped: AtomicU64,
    refresh_failures: AtomicU64,
    refreshes_coalesced: AtomicU64,
}

impl DashboardMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_evicted(&self) {
        self.connections_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_broadcast(&self, sent: u64, failed: u64) {
        self.updates_broadcast.fetch_add(1, Ordering::Relaxed);
        self.messages_sent.fetch_add(sent, Ordering::Relaxed);
        self.messages_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_failed(&self) {
        self.messages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_completed(&self) {
        self.refreshes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_skipped(&self) {
        self.refreshes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_failed(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_coalesced(&self) {
        self.refreshes_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DashboardMetricsSnapshot {
        DashboardMetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connections_evicted: self.connections_evicted.load(Ordering::Relaxed),
            updates_broadcast: self.updates_broadcast.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            refreshes_completed: self.refreshes_completed.load(Ordering::Relaxed),
            refreshes_skipped: self.refreshes_skipped.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            refreshes_coalesced: self.refreshes_coalesced.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetricsSnapshot {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub connections_evicted: u64,
    pub updates_broadcast: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub refreshes_completed: u64,
    pub refreshes_skipped: u64,
    pub refresh_failures: u64,
    pub refreshes_coalesced: u64,
}
