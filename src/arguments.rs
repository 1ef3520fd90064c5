/// Centralized argument handling for incident-relay
///
/// Command-line arguments are parsed once at startup and stored globally so
/// that the logger and the entry point can query debug flags without
/// threading the parsed struct through every call.
use clap::Parser;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

/// Command-line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "incident-relay",
    version,
    about = "Relays incident webhooks and serves a live metrics dashboard"
)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the webserver bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the webserver bind port
    #[arg(long)]
    pub port: Option<u16>,

    /// Show verbose logs for every module
    #[arg(long)]
    pub verbose: bool,

    /// Only show errors
    #[arg(long)]
    pub quiet: bool,

    /// Debug logging for the dashboard broadcast subsystem
    #[arg(long)]
    pub debug_dashboard: bool,

    /// Debug logging for HTTP and WebSocket handling
    #[arg(long)]
    pub debug_webserver: bool,

    /// Debug logging for metrics collection
    #[arg(long)]
    pub debug_metrics: bool,

    /// Debug logging for the incident store
    #[arg(long)]
    pub debug_store: bool,

    /// Debug logging for the system lifecycle
    #[arg(long)]
    pub debug_system: bool,
}

static ARGS: OnceCell<Args> = OnceCell::new();

/// Parse process arguments and store them globally.
///
/// Exits the process on invalid arguments (clap prints usage).
pub fn init_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}

/// Store explicit arguments (used by tests and embedding binaries).
/// Returns false when arguments were already initialized.
pub fn set_args(args: Args) -> bool {
    ARGS.set(args).is_ok()
}

/// Parsed arguments, or defaults when `init_args` was never called
pub fn args() -> &'static Args {
    ARGS.get_or_init(Args::default)
}

/// Configuration path from `--config`, falling back to the default
pub fn config_path() -> PathBuf {
    args()
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Debug tags requested on the command line (`--debug-<tag>`)
pub fn debug_tags() -> Vec<&'static str> {
    let args = args();
    let mut tags = Vec::new();
    if args.debug_dashboard {
        tags.push("dashboard");
    }
    if args.debug_webserver {
        tags.push("webserver");
    }
    if args.debug_metrics {
        tags.push("metrics");
    }
    if args.debug_store {
        tags.push("store");
    }
    if args.debug_system {
        tags.push("system");
    }
    tags
}

pub fn is_debug_dashboard_enabled() -> bool {
    args().debug_dashboard
}

pub fn is_debug_webserver_enabled() -> bool {
    args().debug_webserver
}

pub fn is_verbose_enabled() -> bool {
    args().verbose
}

pub fn is_quiet_enabled() -> bool {
    args().quiet
}
