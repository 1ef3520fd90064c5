/// Connection registry - who is currently watching
///
/// All operations are synchronous and in-memory. The mutex is held only for
/// the mutation or copy itself and never across an await, so broadcast and
/// sweep work on a `snapshot()` copy while connects and disconnects proceed.
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use super::message::{Topic, UpdateKind};
use super::transport::Transport;

// ============================================================================
// CONNECTION
// ============================================================================

/// Opaque per-connection identifier, assigned by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live viewer
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    transport: Arc<dyn Transport>,
    topics: HashSet<Topic>,
    last_seen: Instant,
}

impl Connection {
    /// New connection subscribed to `overview`, live as of now
    pub fn new(id: ConnectionId, transport: Arc<dyn Transport>) -> Self {
        let mut topics = HashSet::new();
        topics.insert(Topic::Overview);
        Self {
            id,
            transport,
            topics,
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn topics(&self) -> &HashSet<Topic> {
        &self.topics
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Subscribed to the wildcard or to the kind's own topic
    pub fn wants(&self, kind: UpdateKind) -> bool {
        self.topics.contains(&Topic::Overview) || self.topics.contains(&kind.topic())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("topics", &self.topics)
            .field("last_seen", &self.last_seen)
            .finish()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, connection: Connection) {
        self.connections.lock().insert(connection.id, connection);
    }

    /// Remove a connection; `None` if it was already gone
    pub fn unregister(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.lock().remove(&id)
    }

    /// Add topics. Returns false if the connection is gone.
    pub fn subscribe(&self, id: ConnectionId, topics: &[Topic]) -> bool {
        match self.connections.lock().get_mut(&id) {
            Some(connection) => {
                connection.topics.extend(topics.iter().copied());
                true
            }
            None => false,
        }
    }

    /// Remove topics. Returns false if the connection is gone.
    pub fn unsubscribe(&self, id: ConnectionId, topics: &[Topic]) -> bool {
        match self.connections.lock().get_mut(&id) {
            Some(connection) => {
                for topic in topics {
                    connection.topics.remove(topic);
                }
                true
            }
            None => false,
        }
    }

    /// Mark the connection live as of now. Returns false if it is gone.
    pub fn touch(&self, id: ConnectionId) -> bool {
        match self.connections.lock().get_mut(&id) {
            Some(connection) => {
                connection.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of every live connection
    pub fn snapshot(&self) -> Vec<Connection> {
        self.connections.lock().values().cloned().collect()
    }

    pub fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.lock().get(&id).cloned()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Subscriber count per topic; every known topic is present
    pub fn topic_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = Topic::ALL
            .iter()
            .map(|topic| (topic.code().to_string(), 0))
            .collect();
        for connection in self.connections.lock().values() {
            for topic in &connection.topics {
                *counts.entry(topic.code().to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Remove and return every connection
    pub fn drain(&self) -> Vec<Connection> {
        self.connections.lock().drain().map(|(_, c)| c).collect()
    }
}
