//! Logging setup

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{info, Level};

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let log_level = match config.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    if config.sanitize_user_ids {
        info!("Logging initialized with user id sanitization enabled");
    }

    Ok(())
}

/// Stable, non-reversible stand-in for a user id in log output
pub fn sanitize_user_id(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    let fingerprint: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    let prefix: String = user_id.chars().take(2).collect();
    format!("{}***{}", prefix, fingerprint)
}

/// User id as it should appear in log fields
pub fn log_user_id(user_id: &str, sanitize: bool) -> String {
    if sanitize {
        sanitize_user_id(user_id)
    } else {
        user_id.to_string()
    }
}
