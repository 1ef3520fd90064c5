//! Real-time dashboard broadcast subsystem
//!
//! Viewers connect through a [`Transport`] and are tracked in the
//! [`ConnectionRegistry`] with a topic set. Updates come from two sides:
//! the periodic [`Refresher`] pulls aggregate numbers from a
//! [`MetricsProvider`], and the [`EventNotifier`] forwards webhook events
//! as they arrive. The [`LivenessSweeper`] evicts viewers that stopped
//! sending heartbeats. [`DashboardService`] owns all of it.

pub mod broadcast;
pub mod message;
pub mod metrics;
pub mod notifier;
pub mod payloads;
pub mod provider;
pub mod refresher;
pub mod registry;
pub mod service;
pub mod sweeper;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{BroadcastOutcome, Broadcaster};
pub use message::{ClientMessage, ServerMessage, Topic, Update, UpdateKind, UpdatePayload};
pub use metrics::{DashboardMetrics, DashboardMetricsSnapshot};
pub use notifier::EventNotifier;
pub use payloads::{
    ActivityEvent, DeliveryEvent, HealthReport, HealthStatus, IncidentEvent, MetricsSnapshot,
    SummaryCounters, TrendPoint,
};
pub use provider::MetricsProvider;
pub use refresher::{RefreshOutcome, Refresher};
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
pub use service::{DashboardService, DashboardStats};
pub use sweeper::LivenessSweeper;
pub use transport::{ChannelTransport, Transport};
