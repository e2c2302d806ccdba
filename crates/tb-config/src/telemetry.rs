//! Installs the global `tracing` subscriber.

use crate::settings::LogSettings;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// `RUST_LOG` wins over the configured directive when it is set.
pub fn env_filter(settings: &LogSettings) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&settings.filter)?),
    }
}

/// Installs a fmt subscriber (plain or JSON lines). Fails instead of
/// panicking when a global subscriber is already set.
pub fn init_tracing(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| TelemetryError::Install(e.to_string()))?;
    tracing::debug!(json = settings.json, "tracing initialised");
    Ok(())
}
