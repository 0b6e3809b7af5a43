//! Command-line argument definitions.

use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use nix::sys::signal::Signal;
use thiserror::Error;

/// Controls one service-managed daemon on the local host.
#[derive(Parser, Debug)]
#[command(name = "warden", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Lifecycle action to perform.
    #[command(subcommand)]
    pub(crate) action: Action,
}

/// Daemon addressed by an action.
#[derive(Args, Debug, Clone)]
pub(crate) struct Target {
    /// Daemon role, optionally qualified (for example `osd` or `ceph.osd`).
    #[arg(long)]
    pub(crate) role: String,
    /// Instance id within the role's kind.
    #[arg(long)]
    pub(crate) id: String,
}

/// Lifecycle actions.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Action {
    /// Starts the daemon, restarting it when already running.
    Start(Target),
    /// Stops the daemon.
    Stop(Target),
    /// Restarts the daemon, starting it when stopped.
    Restart(Target),
    /// Prints whether the daemon runs and how it last exited.
    Status(Target),
    /// Prints the daemon's PID.
    Pid(Target),
    /// Sends a signal to the daemon's process.
    Signal {
        /// Signal name or number (`TERM`, `SIGHUP`, `9`).
        #[arg(value_parser = parse_signal)]
        signal: Signal,
        #[command(flatten)]
        target: Target,
    },
}

impl Action {
    pub(crate) const fn target(&self) -> &Target {
        match self {
            Self::Start(target)
            | Self::Stop(target)
            | Self::Restart(target)
            | Self::Status(target)
            | Self::Pid(target)
            | Self::Signal { target, .. } => target,
        }
    }
}

/// A signal argument that names no known signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal '{0}'")]
pub(crate) struct UnknownSignal(String);

pub(crate) fn parse_signal(text: &str) -> Result<Signal, UnknownSignal> {
    let trimmed = text.trim();
    let unknown = || UnknownSignal(trimmed.to_owned());
    if let Ok(number) = trimmed.parse::<i32>() {
        return Signal::try_from(number).map_err(|_| unknown());
    }
    let upper = trimmed.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    Signal::from_str(&name).map_err(|_| unknown())
}
