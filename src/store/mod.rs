//! Incident store
//!
//! Minimal sqlite persistence for received incidents and delivery results.
//! The dashboard only reads it through [`SqliteMetricsProvider`]; webhook
//! handlers write to it before notifying viewers.

mod aggregate;
mod provider;

pub use provider::SqliteMetricsProvider;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::dashboard::payloads::{DeliveryEvent, IncidentEvent};
use crate::errors::StoreError;
use crate::logger::{self, LogTag};

const SCHEMA: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA busy_timeout = 5000;

    CREATE TABLE IF NOT EXISTS incidents (
        number TEXT PRIMARY KEY,
        short_description TEXT,
        priority TEXT,
        state TEXT,
        received_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_incidents_received ON incidents(received_at DESC);

    CREATE TABLE IF NOT EXISTS deliveries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        incident_number TEXT NOT NULL,
        channel TEXT NOT NULL,
        success INTEGER NOT NULL,
        error TEXT,
        delivered_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_deliveries_time ON deliveries(delivered_at DESC);
"#;

/// Cheap to clone; all clones share one connection
#[derive(Clone)]
pub struct IncidentStore {
    conn: Arc<Mutex<Connection>>,
}

impl IncidentStore {
    /// Open (or create) the database file, creating its directory if needed
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self::from_connection(Connection::open(path)?)?;
        logger::info(
            LogTag::Store,
            &format!("Incident store opened at {}", path.display()),
        );
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against a clone of this store on the blocking pool.
    ///
    /// Async callers go through here so sqlite work and the connection mutex
    /// stay off the runtime workers.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&IncidentStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Insert or update an incident. Returns true when the number was new.
    pub fn record_incident(&self, incident: &IncidentEvent) -> Result<bool, StoreError> {
        self.record_incident_at(incident, Utc::now())
    }

    pub fn record_incident_at(
        &self,
        incident: &IncidentEvent,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let ts = at.timestamp();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT received_at FROM incidents WHERE number = ?1",
                params![incident.number],
                |row| row.get(0),
            )
            .optional()?;

        // received_at keeps the first sighting; other fields only move forward
        conn.execute(
            "INSERT INTO incidents
             (number, short_description, priority, state, received_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(number) DO UPDATE SET
                short_description = COALESCE(excluded.short_description, short_description),
                priority = COALESCE(excluded.priority, priority),
                state = COALESCE(excluded.state, state),
                updated_at = excluded.updated_at",
            params![
                incident.number,
                incident.short_description,
                incident.priority,
                incident.state,
                ts
            ],
        )?;

        let is_new = existing.is_none();
        logger::debug(
            LogTag::Store,
            &format!(
                "Recorded incident {} ({})",
                incident.number,
                if is_new { "new" } else { "update" }
            ),
        );
        Ok(is_new)
    }

    pub fn record_delivery(&self, delivery: &DeliveryEvent) -> Result<(), StoreError> {
        self.record_delivery_at(delivery, Utc::now())
    }

    pub fn record_delivery_at(
        &self,
        delivery: &DeliveryEvent,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO deliveries
             (incident_number, channel, success, error, delivered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                delivery.incident_number,
                delivery.channel,
                delivery.success,
                delivery.error,
                at.timestamp()
            ],
        )?;

        logger::debug(
            LogTag::Store,
            &format!(
                "Recorded delivery for {} via {} (success={})",
                delivery.incident_number, delivery.channel, delivery.success
            ),
        );
        Ok(())
    }

    pub fn incident_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Hold the connection lock for `duration`, as a long aggregation would
    #[cfg(test)]
    pub(crate) fn hold_connection(&self, duration: std::time::Duration) {
        let _conn = self.conn.lock();
        std::thread::sleep(duration);
    }
}
