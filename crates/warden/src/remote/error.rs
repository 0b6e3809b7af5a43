//! Errors raised by remote command execution.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Failures reported by a [`Remote`](super::Remote) or one of its processes.
///
/// I/O errors are wrapped in `Arc` so the enum stays cheap to clone into log
/// fields and remains `Send + Sync`.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The command exited non-zero while strict status checking was enabled.
    #[error("command '{command}' on {remote} failed with status {exit_status}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status reported by the host.
        exit_status: i32,
        /// Name of the host the command ran on.
        remote: String,
    },

    /// The command did not exit within the allotted time.
    #[error("command '{command}' on {remote} did not exit within {timeout_secs}s")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Name of the host the command ran on.
        remote: String,
        /// Timeout that elapsed, in seconds.
        timeout_secs: u64,
    },

    /// The command was terminated without an exit status (for example by a
    /// signal).
    #[error("command '{command}' on {remote} terminated without an exit status")]
    Crashed {
        /// Rendered command line.
        command: String,
        /// Name of the host the command ran on.
        remote: String,
    },

    /// The command could not be started.
    #[error("failed to start '{command}' on {remote}: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Name of the host the command was issued to.
        remote: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Reading from or writing to the command's streams failed.
    #[error("I/O error talking to '{command}' on {remote}: {source}")]
    Io {
        /// Rendered command line.
        command: String,
        /// Name of the host the command ran on.
        remote: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Standard input was closed or never piped.
    #[error("standard input of '{command}' is not writable")]
    StdinClosed {
        /// Rendered command line.
        command: String,
    },
}

impl RemoteError {
    /// Exit status carried by a `CommandFailed` error.
    #[must_use]
    pub const fn exit_status(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_status, .. } => Some(*exit_status),
            _ => None,
        }
    }
}
