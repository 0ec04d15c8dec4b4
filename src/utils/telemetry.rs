//! Tracing subscriber setup.

use super::toml_config::{LogFormat, ServerConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{0}': {1}")]
    InvalidFilter(String, String),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Builds the filter: `RUST_LOG` when set, otherwise `log_level`.
pub fn env_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| TelemetryError::InvalidFilter(log_level.to_string(), e.to_string()))
}

/// Installs the global tracing subscriber. Fails if one is already set.
pub fn init_tracing(server: &ServerConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(&server.log_level)?;

    match server.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    }
    .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        format = ?server.log_format,
        level = %server.log_level,
        "Logging initialized"
    );

    Ok(())
}
