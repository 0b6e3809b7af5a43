//! Lifecycle control for daemons running on remote hosts.
//!
//! A test orchestrator deploys daemons (storage, monitor, gateway
//! processes) to hosts and needs to start, stop, restart, signal, and query
//! them. Two control planes exist and both sit behind [`DaemonControl`]:
//!
//! - [`ProcessDaemon`] launches the daemon itself through a [`remote::Remote`]
//!   and keeps the process handle. Stopping closes the daemon's stdin and
//!   waits; signals travel in-band as one byte on stdin.
//! - [`SystemdDaemon`] leaves the daemon to the host's service manager. Each
//!   operation is a fresh `systemctl`, `ps`, or `kill` invocation, and state
//!   is read back by parsing command output.
//!
//! [`DaemonGroup`] keeps one control per role and id, built for the
//! configured [`warden_config::ControlMode`].

mod cli;
mod daemon;
mod error;
mod group;
mod process;
pub mod remote;
pub mod systemd;
pub mod telemetry;
mod template;

pub use cli::{CliError, run};
pub use daemon::{DaemonControl, DaemonIdentity, Running, SignalDelivery};
pub use error::DaemonError;
pub use group::DaemonGroup;
pub use nix::sys::signal::Signal;
pub use process::ProcessDaemon;
pub use systemd::SystemdDaemon;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use template::{CommandTemplate, LaunchOverrides};

#[cfg(test)]
mod tests;
