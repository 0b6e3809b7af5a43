//! Domain errors raised by daemon control operations.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::systemd::StatusParseError;

/// Errors arising from daemon lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum DaemonError {
    /// The operation needs a running daemon and none is tracked.
    #[error("daemon {role}.{id} is not running")]
    NotRunning {
        /// Daemon role.
        role: String,
        /// Daemon id.
        id: String,
    },

    /// A command, or the daemon itself, exited with a non-zero status.
    #[error("command '{command}' on {remote} failed with status {exit_status}")]
    CommandFailed {
        /// Command whose failure is reported.
        command: String,
        /// Exit status.
        exit_status: i32,
        /// Host the command ran on.
        remote: String,
    },

    /// The backend cannot derive a PID for this daemon kind.
    #[error("pid lookup is not supported for {kind} daemons under direct process control")]
    PidUnsupported {
        /// Daemon kind.
        kind: String,
    },

    /// A running process was required but no PID was found on the host.
    #[error("no running process found for {role}.{id}")]
    PidUnavailable {
        /// Daemon role.
        role: String,
        /// Daemon id.
        id: String,
    },

    /// Service manager output could not be interpreted.
    #[error("unreadable service state for {role}.{id}: {source}")]
    StatusParse {
        /// Daemon role.
        role: String,
        /// Daemon id.
        id: String,
        /// Parser failure.
        #[source]
        source: StatusParseError,
    },

    /// Any other failure reported by the remote collaborator.
    #[error(transparent)]
    Remote(RemoteError),
}

impl DaemonError {
    /// Exit status carried by a `CommandFailed` error.
    #[must_use]
    pub const fn exit_status(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_status, .. } => Some(*exit_status),
            _ => None,
        }
    }
}

impl From<RemoteError> for DaemonError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::CommandFailed {
                command,
                exit_status,
                remote,
            } => Self::CommandFailed {
                command,
                exit_status,
                remote,
            },
            other => Self::Remote(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_command_failures_share_one_variant() {
        let error = DaemonError::from(RemoteError::CommandFailed {
            command: String::from("sudo systemctl start ceph-osd@3"),
            exit_status: 1,
            remote: String::from("smithi001"),
        });
        assert_eq!(error.exit_status(), Some(1));
        assert!(matches!(error, DaemonError::CommandFailed { .. }));
    }

    #[test]
    fn other_remote_failures_are_wrapped() {
        let error = DaemonError::from(RemoteError::StdinClosed {
            command: String::from("ceph-osd"),
        });
        assert!(matches!(error, DaemonError::Remote(_)));
        assert_eq!(error.exit_status(), None);
        assert!(error.to_string().contains("ceph-osd"));
    }

    #[test]
    fn not_running_message_names_the_daemon() {
        let error = DaemonError::NotRunning {
            role: String::from("ceph.mon"),
            id: String::from("a"),
        };
        assert_eq!(error.to_string(), "daemon ceph.mon.a is not running");
    }
}
