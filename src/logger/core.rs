/// Central filtering: decides whether a message is shown, then hands it to
/// the formatter.
use super::config::{
    get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag, LoggerConfig,
};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Filtering rules:
/// 1. Errors are always shown
/// 2. Debug requires `--debug-<tag>` (or `--verbose`), unless quiet
/// 3. Verbose requires `--verbose` or a per-tag verbose entry
/// 4. Other levels must be within `min_level`
/// 5. A non-empty `enabled_tags` set restricts non-error output to its tags
pub fn should_log(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let level_ok = match level {
        LogLevel::Debug => {
            config.min_level != LogLevel::Error && is_debug_enabled_for_tag(config, tag)
        }
        LogLevel::Verbose => is_verbose_enabled_for_tag(config, tag),
        _ => level <= config.min_level,
    };
    if !level_ok {
        return false;
    }

    config.enabled_tags.is_empty() || config.enabled_tags.contains(&tag.to_debug_key())
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    let config = get_logger_config();
    if !should_log(&config, &tag, level) {
        return;
    }

    super::format::format_and_log(&tag, level, message, config.console_enabled);
}
