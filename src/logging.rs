//! Logging setup

use eyre::{Result, eyre};
use tracing::{debug, info};

/// Parse a level name; unknown names fall back to INFO
pub fn parse_level(level: Option<&str>) -> tracing::Level {
    match level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
        None => tracing::Level::INFO,
    }
}

/// Install a global fmt subscriber
///
/// `RUST_LOG` directives apply on top of `level`. Fails if a global
/// subscriber is already set.
pub fn setup_logging(level: Option<&str>) -> Result<()> {
    let level = parse_level(level);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to setup logging: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    debug!("setup_logging: done");
    Ok(())
}
