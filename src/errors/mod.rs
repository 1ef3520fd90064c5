/// Error types for incident-relay
///
/// The dashboard subsystem never surfaces these to ingestion callers; they
/// are logged at the point of failure. `ConfigError` and `StoreError` do
/// propagate to the binary entry point.
use thiserror::Error;

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("configuration already initialized")]
    AlreadyInitialized,
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Failure pushing to a single viewer connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("outbound queue full")]
    QueueFull,
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("store task failed: {0}")]
    Task(String),
}

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Metrics provider could not produce a snapshot (transient)
    #[error("metrics provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
