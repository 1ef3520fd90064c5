/// Kind-specific payload types carried by dashboard updates
///
/// Event payloads keep caller-supplied fields they do not model in `extra`,
/// so webhook bodies reach viewers unchanged.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_incident_at: Option<DateTime<Utc>>,
    /// Failed / total deliveries over the trend window (0.0 when none)
    pub delivery_failure_rate: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            store_reachable: true,
            last_incident_at: None,
            delivery_failure_rate: 0.0,
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounters {
    pub incidents_total: u64,
    /// Incidents received inside the trend window
    pub incidents_recent: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
}

/// One hourly bucket of the incident trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub bucket: DateTime<Utc>,
    pub incidents: u64,
}

/// Everything the dashboard renders, computed by a metrics provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub health: HealthReport,
    pub summary: SummaryCounters,
    pub trends: Vec<TrendPoint>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// EVENTS
// ============================================================================

/// A new or updated incident received from the ticketing system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IncidentEvent {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            short_description: None,
            priority: None,
            state: None,
            extra: Map::new(),
        }
    }
}

/// Result of relaying an incident to a chat channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub incident_number: String,
    pub channel: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user action worth showing in the activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user: String,
    pub action: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
