//! Structured log initialisation.

use tracing_subscriber::EnvFilter;

use crate::{AppError, LogFormat};

const DEFAULT_FILTER: &str = "info";

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
/// Returns [`AppError::Logging`] when a global subscriber is already set.
pub fn init_logging(format: LogFormat) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| AppError::Logging(error.to_string()))
}
