use crate::control::ControlMode;
use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds to wait for a daemon to exit after stdin has been closed.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 300;

/// Prefix shared by unit families and daemon executables.
pub const DEFAULT_UNIT_PREFIX: &str = "ceph";

/// Number of journal lines captured when a unit exits with a failure.
pub const DEFAULT_JOURNAL_LINES: u32 = 10;

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default daemon control mechanism.
#[must_use]
pub fn default_control_mode() -> ControlMode {
    ControlMode::Process
}

/// Owned unit prefix used where allocation is required.
#[must_use]
pub fn default_unit_prefix() -> String {
    DEFAULT_UNIT_PREFIX.to_owned()
}
