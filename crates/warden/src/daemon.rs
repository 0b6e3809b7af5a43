//! The lifecycle contract shared by every daemon control backend.

use std::fmt;
use std::time::Duration;

use nix::sys::signal::Signal;

use crate::error::DaemonError;
use crate::remote::CommandArg;
use crate::template::LaunchOverrides;

/// Role and id naming one daemon instance.
///
/// The kind is the last dot-separated segment of the role, so `ceph.osd`
/// and `osd` both have kind `osd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DaemonIdentity {
    role: String,
    kind: String,
    id: String,
}

impl DaemonIdentity {
    /// Creates an identity, deriving the kind from `role`.
    #[must_use]
    pub fn new(role: impl Into<String>, id: impl Into<String>) -> Self {
        let role = role.into();
        let kind = role.rsplit('.').next().unwrap_or_default().to_owned();
        Self {
            role,
            kind,
            id: id.into(),
        }
    }

    /// Full role, including any qualifier.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Daemon kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Instance id within the kind.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DaemonIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.role, self.id)
    }
}

/// Evidence that a daemon is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Running {
    /// The controller holds a live process handle.
    Tracked,
    /// The host reports a process with this PID.
    Pid(u32),
}

impl Running {
    /// PID when the evidence came from the host.
    #[must_use]
    pub const fn pid(self) -> Option<u32> {
        match self {
            Self::Tracked => None,
            Self::Pid(pid) => Some(pid),
        }
    }
}

/// How a backend delivers [`DaemonControl::signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDelivery {
    /// The signal number is written as one byte to the daemon's stdin and
    /// the daemon is expected to act on it.
    InBand,
    /// The signal is sent to the daemon's PID with `kill`.
    OsKill,
}

/// Uniform lifecycle operations over one daemon instance.
///
/// Calls on one instance must be serialised; `&mut self` receivers enforce
/// that for the state-changing operations.
pub trait DaemonControl: fmt::Debug + Send {
    /// Role and id of the daemon.
    fn identity(&self) -> &DaemonIdentity;

    /// PID of the running daemon, when the backend can determine one.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::PidUnsupported`] when the backend has no way to
    /// look a PID up, or a remote error when the lookup fails.
    fn pid(&self) -> Result<Option<u32>, DaemonError>;

    /// Starts the daemon, restarting it instead when it is already up.
    ///
    /// # Errors
    ///
    /// Returns an error when the launch command fails.
    fn start(&mut self, timeout: Duration) -> Result<(), DaemonError>;

    /// Stops the daemon. Stopping a stopped daemon logs and succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the stop request itself cannot be issued.
    fn stop(&mut self, timeout: Duration) -> Result<(), DaemonError>;

    /// Stops the daemon if needed and relaunches it with `overrides` applied
    /// to this launch only.
    ///
    /// # Errors
    ///
    /// Returns an error when the launch command fails.
    fn restart(&mut self, overrides: &LaunchOverrides) -> Result<(), DaemonError>;

    /// Restarts with `extra_args` appended to the launch arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the launch command fails.
    fn restart_with_args(&mut self, extra_args: &[CommandArg]) -> Result<(), DaemonError>;

    /// Delivers `signal` to the running daemon; see
    /// [`DaemonControl::signal_delivery`] for the mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::NotRunning`] or [`DaemonError::PidUnavailable`]
    /// when there is nothing to signal.
    fn signal(&mut self, signal: Signal, silent: bool) -> Result<(), DaemonError>;

    /// Mechanism used by [`DaemonControl::signal`].
    fn signal_delivery(&self) -> SignalDelivery;

    /// Evidence that the daemon is running, or `None`.
    ///
    /// # Errors
    ///
    /// Only fails when the host cannot be queried; "not running" is `Ok(None)`.
    fn running(&self) -> Result<Option<Running>, DaemonError>;

    /// Forgets any locally held handle without terminating anything.
    fn reset(&mut self);

    /// Blocks until the daemon exits on its own, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the underlying wait.
    fn wait(&mut self, timeout: Duration) -> Result<(), DaemonError>;

    /// Blocks without a bound until a tracked daemon exits.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the underlying wait.
    fn wait_for_exit(&mut self) -> Result<(), DaemonError>;

    /// Exit status when the daemon has exited, `None` while it runs.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::CommandFailed`] when the daemon exited with a
    /// failure that strict status checking reports.
    fn check_status(&mut self) -> Result<Option<i32>, DaemonError>;

    /// Whether [`DaemonControl::running`] reports the daemon as up.
    ///
    /// # Errors
    ///
    /// Propagates failures of [`DaemonControl::running`].
    fn is_running(&self) -> Result<bool, DaemonError> {
        self.running().map(|running| running.is_some())
    }
}
