/// Configuration schemas - every section defined once with its defaults
use std::time::Duration;

use crate::config_struct;
use crate::errors::ConfigError;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP / WebSocket listener
    pub struct WebserverConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,
        /// Allow any origin (dashboard served from another host)
        cors_permissive: bool = false,
    }
}

// ============================================================================
// DASHBOARD CONFIGURATION
// ============================================================================

config_struct! {
    /// Live dashboard broadcast timers and limits
    pub struct DashboardConfig {
        /// Liveness sweep period
        sweep_interval_secs: u64 = 30,
        /// Evict viewers silent for longer than this
        stale_after_secs: u64 = 60,
        /// Periodic metrics refresh period
        refresh_interval_secs: u64 = 10,
        /// Upper bound on a single transport close during sweep/shutdown
        close_timeout_ms: u64 = 2000,
        /// Per-viewer outbound queue capacity
        client_buffer_size: usize = 256,
        /// Upper bound on waiting for timer tasks at shutdown
        stop_timeout_secs: u64 = 5,
    }
}

// ============================================================================
// STORE CONFIGURATION
// ============================================================================

/// Upper bound on the trend window (31 days of hourly buckets)
pub const MAX_TREND_HOURS: u32 = 24 * 31;

config_struct! {
    /// Incident store (sqlite)
    pub struct StoreConfig {
        path: String = "data/incident-relay.db".to_string(),
        /// Hours covered by the incident trend series
        trend_hours: u32 = 24,
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

config_struct! {
    pub struct LoggingConfig {
        dir: String = "logs".to_string(),
        file_enabled: bool = true,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        dashboard: DashboardConfig = DashboardConfig::default(),
        store: StoreConfig = StoreConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

impl WebserverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("webserver.host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("webserver.port cannot be 0".to_string()));
        }
        Ok(())
    }

    /// Full bind address (host:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_secs == 0 || self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "dashboard intervals must be > 0".to_string(),
            ));
        }
        // A single missed heartbeat must not evict a viewer
        if self.stale_after_secs < self.sweep_interval_secs * 2 {
            return Err(ConfigError::Invalid(format!(
                "dashboard.stale_after_secs ({}) must be at least twice sweep_interval_secs ({})",
                self.stale_after_secs, self.sweep_interval_secs
            )));
        }
        if self.client_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.client_buffer_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.webserver.validate()?;
        self.dashboard.validate()?;
        if self.store.path.is_empty() {
            return Err(ConfigError::Invalid("store.path cannot be empty".to_string()));
        }
        if self.store.trend_hours == 0 || self.store.trend_hours > MAX_TREND_HOURS {
            return Err(ConfigError::Invalid(format!(
                "store.trend_hours ({}) must be between 1 and {}",
                self.store.trend_hours, MAX_TREND_HOURS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dashboard.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.dashboard.stale_after(), Duration::from_secs(60));
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.webserver.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_stale_threshold_must_cover_two_sweeps() {
        let dashboard = DashboardConfig {
            sweep_interval_secs: 30,
            stale_after_secs: 45,
            ..DashboardConfig::default()
        };
        assert!(matches!(dashboard.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.webserver.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trend_window_is_bounded() {
        let mut config = Config::default();
        config.store.trend_hours = MAX_TREND_HOURS;
        assert!(config.validate().is_ok());

        config.store.trend_hours = MAX_TREND_HOURS + 1;
        assert!(config.validate().is_err());

        config.store.trend_hours = 0;
        assert!(config.validate().is_err());
    }
}
