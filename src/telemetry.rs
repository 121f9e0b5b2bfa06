//! Tracing subscriber installation.

use crate::config::{LogFormat, LoggingSettings};
use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Rejected directive.
        filter: String,
        /// Parser failure.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("could not install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Builds the filter: `RUST_LOG` when set, otherwise the configured level.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured level is invalid.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|source| TelemetryError::Filter {
        filter: settings.level.clone(),
        source,
    })
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(env_filter(settings)?);
    match settings.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
    }
    Ok(())
}
