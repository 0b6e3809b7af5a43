//! Tracing subscriber set-up for the controller.
//!
//! Lifecycle events are emitted with a per-module target (`warden::process`,
//! `warden::systemd`, `warden::group`) and carry the daemon's `role` and `id`
//! as fields, so one filter such as `warden::systemd=debug` narrows output to
//! a backend.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};
use warden_config::{Config, LogFormat};

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter is not a valid directive list.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter text from configuration.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config`.
///
/// Only the first successful call installs anything; later calls return a
/// handle without re-reading `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparseable filter and
/// [`TelemetryError::Subscriber`] when a foreign global subscriber exists.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    SUBSCRIBER_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|_| TelemetryHandle)
}

/// Parses the configured filter directives.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the directives do not parse.
pub fn filter_for(config: &Config) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
