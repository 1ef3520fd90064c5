/// Configuration system
///
/// TOML-backed configuration with embedded defaults (`config_struct!`) and a
/// global read-mostly instance for code that has no config handed to it.
/// Long-lived components (the dashboard service) receive their section by
/// value at construction instead.
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{Config, DashboardConfig, LoggingConfig, StoreConfig, WebserverConfig};
pub use utils::{
    get_config_clone, is_config_initialized, load_config_from_path, parse_config, update_config,
    with_config,
};
