use anyhow::{Context, Result};
use std::path::Path;

use incident_relay::{
    arguments::{self, args},
    config,
    logger::{self, LogTag},
    run,
};

#[tokio::main]
async fn main() {
    arguments::init_args();
    logger::init();

    logger::info(
        LogTag::System,
        &format!("incident-relay v{} starting", env!("CARGO_PKG_VERSION")),
    );

    if let Err(e) = start().await {
        logger::error(LogTag::System, &format!("Fatal: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }

    logger::flush();
}

async fn start() -> Result<()> {
    let config_path = arguments::config_path();
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let cli = args();
    if cli.host.is_some() || cli.port.is_some() {
        config::update_config(|cfg| {
            if let Some(host) = &cli.host {
                cfg.webserver.host = host.clone();
            }
            if let Some(port) = cli.port {
                cfg.webserver.port = port;
            }
        })
        .context("Invalid command-line override")?;
    }

    let config = config::get_config_clone();

    if config.logging.file_enabled {
        match logger::init_file_logging(Path::new(&config.logging.dir)) {
            Ok(path) => logger::info(
                LogTag::System,
                &format!("Logging to {}", path.display()),
            ),
            Err(e) => logger::warning(
                LogTag::System,
                &format!("File logging disabled, cannot open {}: {}", config.logging.dir, e),
            ),
        }
    }

    run::run(config).await
}
