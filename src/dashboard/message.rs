/// Dashboard message schema - topics, updates and the wire protocol
///
/// - `Topic`: what a viewer can subscribe to (`overview` is the wildcard)
/// - `Update`: an ephemeral server-side event, tagged by payload kind
/// - `ClientMessage` / `ServerMessage`: JSON frames exchanged with viewers
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::payloads::{ActivityEvent, DeliveryEvent, HealthReport, IncidentEvent, MetricsSnapshot};

// ============================================================================
// EVENT LABELS
// ============================================================================

pub const EVENT_SNAPSHOT: &str = "snapshot";
pub const EVENT_REFRESH: &str = "refresh";
pub const EVENT_TRIGGERED_REFRESH: &str = "triggered";
pub const EVENT_NEW_INCIDENT: &str = "new";
pub const EVENT_DELIVERY: &str = "delivery";
pub const EVENT_USER_ACTIVITY: &str = "user";

/// Error codes carried by `ServerMessage::Error`
pub const ERROR_UNKNOWN_TOPIC: &str = "UNKNOWN_TOPIC";
pub const ERROR_INVALID_MESSAGE: &str = "INVALID_MESSAGE";

// ============================================================================
// UPDATE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Metrics,
    Incident,
    Notification,
    Activity,
    Health,
}

impl UpdateKind {
    /// Topic that selects this kind explicitly
    pub fn topic(&self) -> Topic {
        match self {
            UpdateKind::Metrics => Topic::Metrics,
            UpdateKind::Incident => Topic::Incident,
            UpdateKind::Notification => Topic::Notification,
            UpdateKind::Activity => Topic::Activity,
            UpdateKind::Health => Topic::Health,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.topic().code()
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TOPIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// Default subscription, receives every kind
    Overview,
    Metrics,
    Health,
    Activity,
    Incident,
    Notification,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Overview,
        Topic::Metrics,
        Topic::Health,
        Topic::Activity,
        Topic::Incident,
        Topic::Notification,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Topic::Overview => "overview",
            Topic::Metrics => "metrics",
            Topic::Health => "health",
            Topic::Activity => "activity",
            Topic::Incident => "incident",
            Topic::Notification => "notification",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Topic::ALL.iter().copied().find(|topic| topic.code() == code)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Topic::Overview)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Split topic names into known topics and unrecognized names
pub fn parse_topics(names: &[String]) -> (Vec<Topic>, Vec<String>) {
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        match Topic::from_code(name.trim()) {
            Some(topic) => known.push(topic),
            None => unknown.push(name.clone()),
        }
    }
    (known, unknown)
}

// ============================================================================
// UPDATE
// ============================================================================

/// Kind-tagged payload of an update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    Metrics(MetricsSnapshot),
    Health(HealthReport),
    Incident(IncidentEvent),
    Notification(DeliveryEvent),
    Activity(ActivityEvent),
}

impl UpdatePayload {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdatePayload::Metrics(_) => UpdateKind::Metrics,
            UpdatePayload::Health(_) => UpdateKind::Health,
            UpdatePayload::Incident(_) => UpdateKind::Incident,
            UpdatePayload::Notification(_) => UpdateKind::Notification,
            UpdatePayload::Activity(_) => UpdateKind::Activity,
        }
    }
}

/// Ephemeral update, consumed by one broadcast and discarded
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub event: String,
    pub payload: UpdatePayload,
    pub timestamp: DateTime<Utc>,
}

impl Update {
    pub fn new(event: impl Into<String>, payload: UpdatePayload) -> Self {
        Self {
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn metrics(event: impl Into<String>, snapshot: MetricsSnapshot) -> Self {
        Self::new(event, UpdatePayload::Metrics(snapshot))
    }

    pub fn health(event: impl Into<String>, report: HealthReport) -> Self {
        Self::new(event, UpdatePayload::Health(report))
    }

    pub fn incident(incident: IncidentEvent) -> Self {
        Self::new(EVENT_NEW_INCIDENT, UpdatePayload::Incident(incident))
    }

    pub fn delivery(delivery: DeliveryEvent) -> Self {
        Self::new(EVENT_DELIVERY, UpdatePayload::Notification(delivery))
    }

    pub fn activity(activity: ActivityEvent) -> Self {
        Self::new(EVENT_USER_ACTIVITY, UpdatePayload::Activity(activity))
    }

    pub fn kind(&self) -> UpdateKind {
        self.payload.kind()
    }

    /// Wire frame for this update
    pub fn to_server_message(&self) -> Result<ServerMessage, serde_json::Error> {
        Ok(ServerMessage::Update {
            kind: self.kind(),
            event: self.event.clone(),
            data: serde_json::to_value(&self.payload)?,
            timestamp: self.timestamp,
        })
    }
}

// ============================================================================
// CLIENT MESSAGES (Client → Server)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        topics: Vec<String>,
    },
    Unsubscribe {
        #[serde(default)]
        topics: Vec<String>,
    },
    /// Liveness only, no response
    Heartbeat,
}

// ============================================================================
// SERVER MESSAGES (Server → Client)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Update {
        kind: UpdateKind,
        event: String,
        data: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
    Subscribed {
        topics: Vec<String>,
    },
    Unsubscribed {
        topics: Vec<String>,
    },
    Error {
        message: String,
        code: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            code: code.to_string(),
        }
    }

    /// Kind of the carried update, `None` for control frames
    pub fn update_kind(&self) -> Option<UpdateKind> {
        match self {
            ServerMessage::Update { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_codes_parse_back() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_code(topic.code()), Some(topic));
        }
        assert_eq!(Topic::from_code("deltas"), None);
    }

    #[test]
    fn test_parse_topics_separates_unknown() {
        let names = vec!["health".to_string(), "bogus".to_string(), " metrics ".to_string()];
        let (known, unknown) = parse_topics(&names);
        assert_eq!(known, vec![Topic::Health, Topic::Metrics]);
        assert_eq!(unknown, vec!["bogus".to_string()]);
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","topics":["health"]}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                topics: vec!["health".to_string()]
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Heartbeat);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"resync"}"#).is_err());
    }

    #[test]
    fn test_update_frame_shape() {
        let update = Update::incident(IncidentEvent::new("INC0000123"));
        let frame = serde_json::to_value(update.to_server_message().unwrap()).unwrap();

        assert_eq!(frame["type"], "update");
        assert_eq!(frame["kind"], "incident");
        assert_eq!(frame["event"], "new");
        assert_eq!(frame["data"], json!({"number": "INC0000123"}));
        assert!(frame["timestamp"].is_string());
    }

    #[test]
    fn test_error_frame_shape() {
        let json = ServerMessage::error("UNKNOWN_TOPIC", "no such topic").to_json().unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"code\":\"UNKNOWN_TOPIC\""));
    }
}
