//! Output format of daemon lifecycle events.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the controller renders start, stop, signal, and status events.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with `role` and `id` as top-level fields,
    /// for collection alongside test-run logs.
    #[default]
    Json,
    /// Single-line text for an operator watching a terminal.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from `--log-format` or
/// `WARDEN_LOG_FORMAT`.
pub type LogFormatParseError = strum::ParseError;
