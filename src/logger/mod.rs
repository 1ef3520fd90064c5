//! Structured logging for incident-relay
//!
//! Tag-based logging with per-module debug control:
//! - Standard levels (Error/Warning/Info/Debug/Verbose)
//! - `--debug-<module>` flags enable debug output per tag
//! - Colored console output plus an optional daily log file
//!
//! ## Usage
//!
//! ```rust
//! use incident_relay::logger::{self, LogTag};
//!
//! logger::info(LogTag::Dashboard, "Viewer connected");
//! logger::debug(LogTag::Dashboard, "Broadcast sent=3"); // Only with --debug-dashboard
//! ```
//!
//! Call `logger::init()` once at startup, after arguments are parsed.

mod bridge;
mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, update_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

use std::path::{Path, PathBuf};

/// Initialize the logger from command-line flags and install the `log`
/// facade bridge for third-party crates.
pub fn init() {
    config::init_from_args();
    bridge::install();
}

/// Start mirroring log lines into a daily file under `dir`.
pub fn init_file_logging(dir: &Path) -> std::io::Result<PathBuf> {
    file::init_file_logging(dir)
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, shown only with `--debug-<tag>`
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, shown only with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Flush pending file writes. Call during shutdown.
pub fn flush() {
    file::flush_file_logging();
}
