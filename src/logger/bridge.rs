/// `log` facade bridge
///
/// Routes records from dependencies that log through the `log` facade (such
/// as tungstenite under axum's WebSocket support) into the tagged logger.
/// axum, hyper and tower-http emit through `tracing`, which is not bridged.
/// Only warnings and errors are forwarded.
use log::{LevelFilter, Metadata, Record};

use super::levels::LogLevel;
use super::tags::LogTag;

struct Bridge;

/// Tag named after the crate that emitted the record
fn tag_for_target(target: &str) -> LogTag {
    match target.split("::").next() {
        Some(name) if !name.is_empty() => LogTag::Other(name.to_string()),
        _ => LogTag::Other("external".to_string()),
    }
}

static BRIDGE: Bridge = Bridge;

impl log::Log for Bridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        super::core::log_internal(
            tag_for_target(record.target()),
            LogLevel::from(record.level()),
            &record.args().to_string(),
        );
    }

    fn flush(&self) {
        super::file::flush_file_logging();
    }
}

/// Install the bridge as the global `log` logger. A no-op if another logger
/// was installed first.
pub fn install() {
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}
