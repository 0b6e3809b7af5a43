//! Shared configuration for the warden daemon controller.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then a TOML
//! file (`--config-path` or a discovered `.warden.toml`), then `WARDEN_*`
//! environment variables, then command-line flags. Both the library (through
//! `DaemonGroup::from_config`) and the `warden` binary read the same
//! structure so an orchestrator and an operator agree on timeouts, unit
//! naming, and the control mechanism in use.

mod control;
mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use control::{ControlMode, ControlModeParseError};
pub use defaults::{
    DEFAULT_JOURNAL_LINES, DEFAULT_LOG_FILTER, DEFAULT_STOP_TIMEOUT_SECS, DEFAULT_UNIT_PREFIX,
    default_control_mode, default_log_filter, default_log_filter_string, default_log_format,
    default_unit_prefix,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for daemon control.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WARDEN")]
pub struct Config {
    /// `tracing` filter expression applied to emitted events.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for emitted events.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Mechanism used to control daemon instances.
    #[ortho_config(default = defaults::default_control_mode())]
    pub control_mode: ControlMode,
    /// Seconds to wait for a daemon to exit when it is stopped internally.
    #[ortho_config(default = DEFAULT_STOP_TIMEOUT_SECS)]
    pub stop_timeout_secs: u64,
    /// Prefix for unit families and daemon executables (`ceph` yields
    /// `ceph-osd@3`).
    #[ortho_config(default = defaults::default_unit_prefix())]
    pub unit_prefix: String,
    /// Journal lines captured when a unit exits with a failure status.
    #[ortho_config(default = DEFAULT_JOURNAL_LINES)]
    pub journal_lines: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            control_mode: default_control_mode(),
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
            unit_prefix: default_unit_prefix(),
            journal_lines: DEFAULT_JOURNAL_LINES,
        }
    }
}

impl Config {
    /// Filter expression for the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Control mechanism used when building daemon instances.
    #[must_use]
    pub const fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// Timeout applied to internal stops.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Unit family prefix.
    #[must_use]
    pub fn unit_prefix(&self) -> &str {
        &self.unit_prefix
    }

    /// Journal lines captured for diagnostics.
    #[must_use]
    pub const fn journal_lines(&self) -> u32 {
        self.journal_lines
    }
}
