//! Collaborator interface for running commands on a daemon's host.
//!
//! Daemon controls never talk to a host directly. They hand a [`RunRequest`]
//! to a [`Remote`] and receive a [`RemoteProcess`] handle back. The transport
//! behind the trait (SSH, a container exec, or the local shell through
//! [`LocalRemote`]) is owned by the orchestrator.

mod command;
mod error;
mod local;

use std::fmt;
use std::time::Duration;

pub use command::{CommandArg, RunOptions, RunRequest, render_command};
pub use error::RemoteError;
pub use local::LocalRemote;

/// Handle to a command started on a remote host.
pub trait RemoteProcess: fmt::Debug + Send {
    /// Writes `bytes` to the command's standard input and flushes them.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::StdinClosed`] when stdin was not piped or has
    /// been closed, or [`RemoteError::Io`] when the write fails.
    fn write_stdin(&mut self, bytes: &[u8]) -> Result<(), RemoteError>;

    /// Closes standard input. Closing an already closed stream is a no-op.
    fn close_stdin(&mut self);

    /// Returns captured standard output and clears the buffer.
    ///
    /// Empty unless the command ran with `capture_stdout` and has completed.
    fn take_stdout(&mut self) -> String;

    /// Checks for exit without blocking.
    ///
    /// Returns `Ok(None)` while the command is still running and the exit
    /// status once it has finished.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::CommandFailed`] when the command exited
    /// non-zero under strict status checking.
    fn poll(&mut self) -> Result<Option<i32>, RemoteError>;

    /// Blocks until the command exits, bounded by `timeout` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Timeout`] when the timeout elapses and
    /// [`RemoteError::CommandFailed`] when the command exited non-zero under
    /// strict status checking.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<i32, RemoteError>;
}

/// A host on which commands can be issued.
pub trait Remote: fmt::Debug + Send + Sync {
    /// Name of the host used in logs and errors.
    fn name(&self) -> &str;

    /// Starts `request` on the host.
    ///
    /// When the request waits (the default) the call blocks until the
    /// command completes and the returned handle is already finished.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the command cannot be started, or when a
    /// waited command fails under strict status checking.
    fn run(&self, request: RunRequest) -> Result<Box<dyn RemoteProcess>, RemoteError>;

    /// Runs `request` to completion and returns its standard output.
    ///
    /// The request's options are overlaid with `wait` and `capture_stdout`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Remote::run`].
    fn run_captured(&self, request: RunRequest) -> Result<String, RemoteError> {
        let options = request.options().merged(&RunOptions {
            wait: Some(true),
            ..RunOptions::capture()
        });
        let mut process = self.run(RunRequest::new(request.args().to_vec(), options))?;
        Ok(process.take_stdout())
    }
}
