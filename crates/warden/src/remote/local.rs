//! [`Remote`] implementation backed by the local shell.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use super::{Remote, RemoteError, RemoteProcess, RunRequest};

/// Log target for local command execution.
const LOCAL_TARGET: &str = "warden::remote::local";

/// Runs commands on this machine through `sh -c`.
///
/// Useful when the controller and the daemons share a host, and as a real
/// process backend in tests.
#[derive(Debug, Clone)]
pub struct LocalRemote {
    name: String,
}

impl LocalRemote {
    /// Creates a local remote named `localhost`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("localhost")
    }

    /// Creates a local remote reported under `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LocalRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl Remote for LocalRemote {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, request: RunRequest) -> Result<Box<dyn RemoteProcess>, RemoteError> {
        let command_line = request.rendered();
        let options = request.options();

        debug!(
            target: LOCAL_TARGET,
            remote = %self.name,
            command = %request.display_name(),
            wait = options.waits(),
            "running command"
        );

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .envs(&options.env)
            .stdin(if options.pipes_stdin() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(if options.captures_stdout() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::null());

        let mut child = command.spawn().map_err(|source| RemoteError::Spawn {
            command: command_line.clone(),
            remote: self.name.clone(),
            source: Arc::new(source),
        })?;

        let mut process = LocalProcess {
            stdin: child.stdin.take(),
            stdout: child.stdout.take().map(spawn_reader),
            child,
            command: command_line,
            remote: self.name.clone(),
            captured: String::new(),
            exit_status: None,
            check_status: options.checks_status(),
        };

        if options.waits() {
            process.wait(None)?;
        }

        Ok(Box::new(process))
    }
}

/// Reads a captured stdout pipe to EOF off the caller's thread, so a
/// bounded wait is never held up by the pipe.
fn spawn_reader(mut pipe: ChildStdout) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut buffer = String::new();
        pipe.read_to_string(&mut buffer).map(|_| buffer)
    })
}

/// A command started by [`LocalRemote`].
#[derive(Debug)]
pub struct LocalProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<JoinHandle<io::Result<String>>>,
    command: String,
    remote: String,
    captured: String,
    exit_status: Option<i32>,
    check_status: bool,
}

impl LocalProcess {
    fn io_error(&self, source: io::Error) -> RemoteError {
        RemoteError::Io {
            command: self.command.clone(),
            remote: self.remote.clone(),
            source: Arc::new(source),
        }
    }

    /// Collects captured output once the child has exited.
    fn drain_stdout(&mut self) -> Result<(), RemoteError> {
        let Some(reader) = self.stdout.take() else {
            return Ok(());
        };
        let output = reader
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout reader panicked")))
            .map_err(|source| self.io_error(source))?;
        self.captured.push_str(&output);
        Ok(())
    }

    fn record_exit(&mut self, status: ExitStatus) -> Result<i32, RemoteError> {
        let Some(code) = status.code() else {
            return Err(RemoteError::Crashed {
                command: self.command.clone(),
                remote: self.remote.clone(),
            });
        };
        debug!(
            target: LOCAL_TARGET,
            remote = %self.remote,
            command = %self.command,
            exit_status = code,
            "command exited"
        );
        self.exit_status = Some(code);
        self.checked(code)
    }

    fn checked(&self, code: i32) -> Result<i32, RemoteError> {
        if self.check_status && code != 0 {
            return Err(RemoteError::CommandFailed {
                command: self.command.clone(),
                exit_status: code,
                remote: self.remote.clone(),
            });
        }
        Ok(code)
    }
}

impl RemoteProcess for LocalProcess {
    fn write_stdin(&mut self, bytes: &[u8]) -> Result<(), RemoteError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RemoteError::StdinClosed {
                command: self.command.clone(),
            });
        };
        let result = stdin.write_all(bytes).and_then(|()| stdin.flush());
        result.map_err(|source| self.io_error(source))
    }

    fn close_stdin(&mut self) {
        // Dropping the pipe delivers EOF to the child.
        drop(self.stdin.take());
    }

    fn take_stdout(&mut self) -> String {
        std::mem::take(&mut self.captured)
    }

    fn poll(&mut self) -> Result<Option<i32>, RemoteError> {
        if let Some(code) = self.exit_status {
            return self.checked(code).map(Some);
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.drain_stdout()?;
                self.record_exit(status).map(Some)
            }
            Ok(None) => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<i32, RemoteError> {
        if let Some(code) = self.exit_status {
            return self.checked(code);
        }

        let status = match timeout {
            Some(limit) => match self.child.wait_timeout(limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    drop(self.child.kill());
                    drop(self.child.wait());
                    return Err(RemoteError::Timeout {
                        command: self.command.clone(),
                        remote: self.remote.clone(),
                        timeout_secs: limit.as_secs(),
                    });
                }
                Err(source) => return Err(self.io_error(source)),
            },
            None => self.child.wait().map_err(|source| self.io_error(source))?,
        };
        self.drain_stdout()?;
        self.record_exit(status)
    }
}
