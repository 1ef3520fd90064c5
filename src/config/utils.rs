/// Configuration loading and global access helpers
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use super::schemas::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};

/// Global configuration instance
static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse a TOML document; missing sections and fields take their defaults
pub fn parse_config(contents: &str, origin: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Load configuration from `path` and install it globally.
///
/// A missing file is not an error: defaults are used and a warning logged.
/// Returns the loaded configuration.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();

    let config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        parse_config(&contents, &display)?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", display),
        );
        Config::default()
    };

    config.validate()?;

    CONFIG
        .set(RwLock::new(config.clone()))
        .map_err(|_| ConfigError::AlreadyInitialized)?;

    logger::debug(LogTag::Config, &format!("Configuration loaded from '{}'", display));
    Ok(config)
}

/// Read access to the global configuration.
///
/// Falls back to defaults when `load_config_from_path` was never called.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let config = lock.read();
    f(&config)
}

/// Mutate the global configuration in place, keeping it valid.
///
/// The change is rejected (and the previous values kept) if the result
/// fails validation.
pub fn update_config<F>(f: F) -> Result<(), ConfigError>
where
    F: FnOnce(&mut Config),
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let mut guard = lock.write();
    let mut updated = guard.clone();
    f(&mut updated);
    updated.validate()?;
    *guard = updated;
    Ok(())
}

/// Clone of the whole configuration, for use across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}
