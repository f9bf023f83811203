use anyhow::Result;
use gaze_tracking_service::{
    config::{self, ConfigSource},
    server,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

/// A usable RUST_LOG takes precedence over the configured level
fn log_filter(rust_log: Option<String>, level: &str) -> Result<EnvFilter> {
    match rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        Some(filter) => Ok(filter),
        None => Ok(EnvFilter::try_new(level)?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let loaded = match config::load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let config = loaded.config;

    let log_level = config.server.logs.level.clone();

    // Validate log level
    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let filter = log_filter(std::env::var("RUST_LOG").ok(), &log_level)?;
    let effective_filter = filter.to_string();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!(
        "Starting GazeTracking service {} with log filter: {}",
        env!("CARGO_PKG_VERSION"),
        effective_filter
    );
    match &loaded.source {
        ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
        ConfigSource::Defaults(path) => warn!(
            "Configuration file {} not found, using defaults",
            path.display()
        ),
    }

    server::run(config).await?;

    Ok(())
}
