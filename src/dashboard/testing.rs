//! Test doubles for the dashboard seams

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::message::{ServerMessage, UpdateKind};
use super::payloads::{HealthReport, MetricsSnapshot, SummaryCounters};
use super::provider::MetricsProvider;
use super::transport::Transport;
use crate::errors::{DashboardError, TransportError};

/// Transport that records every pushed frame
#[derive(Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<Arc<ServerMessage>>>,
    fail_pushes: AtomicBool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    close_delay: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport whose `close` hangs for `delay`
    pub fn slow_to_close(delay: Duration) -> Arc<Self> {
        let transport = Self::default();
        *transport.close_delay.lock() = Some(delay);
        Arc::new(transport)
    }

    pub fn fail_pushes(&self) {
        self.fail_pushes.store(true, Ordering::SeqCst);
    }

    pub fn frames(&self) -> Vec<Arc<ServerMessage>> {
        self.frames.lock().clone()
    }

    /// Kinds of the update frames received, in order
    pub fn kinds(&self) -> Vec<UpdateKind> {
        self.frames
            .lock()
            .iter()
            .filter_map(|frame| frame.update_kind())
            .collect()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn push(&self, message: Arc<ServerMessage>) -> Result<(), TransportError> {
        if self.fail_pushes.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.frames.lock().push(message);
        Ok(())
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.close_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub fn sample_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        health: HealthReport::healthy(),
        summary: SummaryCounters {
            incidents_total: 3,
            incidents_recent: 2,
            deliveries_succeeded: 5,
            deliveries_failed: 1,
        },
        trends: Vec::new(),
        generated_at: Utc::now(),
    }
}

/// Provider that counts calls and can be told to fail
#[derive(Default)]
pub struct FakeProvider {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let provider = Self::default();
        *provider.delay.lock() = Some(delay);
        Arc::new(provider)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetricsProvider for FakeProvider {
    async fn snapshot(&self) -> Result<MetricsSnapshot, DashboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DashboardError::ProviderUnavailable("database offline".to_string()));
        }
        Ok(sample_snapshot())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
