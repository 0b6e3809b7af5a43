//! Selects the mechanism used to control daemon instances.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How daemon instances are launched and supervised on a host.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ControlMode {
    /// The controller spawns the daemon and keeps its process handle.
    #[default]
    Process,
    /// The host service manager owns the daemon; the controller issues
    /// `systemctl` commands and reads state back from it.
    Systemd,
}

/// Errors encountered while parsing a [`ControlMode`] from text.
pub type ControlModeParseError = strum::ParseError;
