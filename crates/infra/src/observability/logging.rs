//! Global `tracing` subscriber installation
//!
//! `RUST_LOG` takes precedence over the configured level, so a single run can
//! be made noisier without editing the config file.

use cadence_domain::{CadenceError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber described by `config`.
///
/// # Errors
/// Returns `CadenceError::Config` if the level directive is invalid or a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_current_span(true)).try_init()
        }
    };
    installed.map_err(|e| CadenceError::Config(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialised");
    Ok(())
}

/// Build the event filter
///
/// A parseable `env_directive` (normally `RUST_LOG`) wins; otherwise the
/// configured `level` is used.
///
/// # Errors
/// Returns `CadenceError::Config` if `level` is not a valid directive.
pub fn build_filter(env_directive: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(filter) = env_directive.and_then(|d| EnvFilter::try_new(d).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| CadenceError::Config(format!("Invalid log level {:?}: {}", level, e)))
}
