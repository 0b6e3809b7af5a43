//! Daemons controlled through a process handle held by the controller.
//!
//! [`ProcessDaemon`] launches the daemon from its [`CommandTemplate`] and
//! keeps the returned [`RemoteProcess`]. The daemon is expected to cooperate
//! over stdin: closing stdin asks it to exit, and a single byte written to
//! stdin carries a signal number for it to act on.
//!
//! Running state here is local belief. If the remote process dies and
//! nobody calls [`DaemonControl::wait`] or [`DaemonControl::check_status`],
//! [`DaemonControl::running`] keeps reporting it as up.

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tracing::{debug, error, info, warn};

use crate::daemon::{DaemonControl, DaemonIdentity, Running, SignalDelivery};
use crate::error::DaemonError;
use crate::remote::{CommandArg, Remote, RemoteProcess};
use crate::template::{CommandTemplate, LaunchOverrides};

/// Log target for process-backed daemons.
const PROCESS_TARGET: &str = "warden::process";

/// A daemon whose process handle is owned by the controller.
#[derive(Debug)]
pub struct ProcessDaemon {
    identity: DaemonIdentity,
    remote: Arc<dyn Remote>,
    template: CommandTemplate,
    stop_timeout: Duration,
    process: Option<Box<dyn RemoteProcess>>,
}

impl ProcessDaemon {
    /// Creates a control for a daemon that is not yet running.
    #[must_use]
    pub fn new(
        identity: DaemonIdentity,
        remote: Arc<dyn Remote>,
        template: CommandTemplate,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            remote,
            template,
            stop_timeout,
            process: None,
        }
    }

    /// Launch template used by every restart.
    #[must_use]
    pub const fn template(&self) -> &CommandTemplate {
        &self.template
    }

    /// Writes `signal` as one signed byte to the daemon's stdin.
    ///
    /// This is an in-band request understood by cooperating daemons, not an
    /// operating-system signal.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::NotRunning`] when no process is held, or a
    /// remote error when the write fails.
    pub fn write_control_byte(&mut self, signal: Signal) -> Result<(), DaemonError> {
        let process = self.process.as_mut().ok_or_else(|| DaemonError::NotRunning {
            role: self.identity.role().to_owned(),
            id: self.identity.id().to_owned(),
        })?;
        process.write_stdin(&control_byte(signal))?;
        Ok(())
    }

    fn launch(&mut self, request_overrides: &LaunchOverrides) -> Result<(), DaemonError> {
        let request = self.template.launch_request(request_overrides);
        if !request_overrides.is_empty() {
            info!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                extra_args = request_overrides.args.len(),
                "launching with one-off overrides"
            );
        }
        debug!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            command = %request.display_name(),
            "launching daemon"
        );
        self.process = Some(self.remote.run(request)?);
        info!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "started"
        );
        Ok(())
    }

    fn restart_with(&mut self, overrides: &LaunchOverrides) -> Result<(), DaemonError> {
        if self.process.is_some() {
            info!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                "stopping old one"
            );
            self.stop(self.stop_timeout)?;
        }
        self.launch(overrides)
    }
}

/// Encodes a signal number the way cooperating daemons read it: one signed
/// byte. Signal numbers are below 128, so the byte equals the number.
fn control_byte(signal: Signal) -> [u8; 1] {
    let number = u8::try_from(signal as i32)
        .ok()
        .filter(|value| i8::try_from(*value).is_ok())
        .unwrap_or(0x7f);
    [number]
}

impl DaemonControl for ProcessDaemon {
    fn identity(&self) -> &DaemonIdentity {
        &self.identity
    }

    fn pid(&self) -> Result<Option<u32>, DaemonError> {
        Err(DaemonError::PidUnsupported {
            kind: self.identity.kind().to_owned(),
        })
    }

    fn start(&mut self, _timeout: Duration) -> Result<(), DaemonError> {
        if self.process.is_some() {
            warn!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                "restarting a running daemon"
            );
        }
        self.restart(&LaunchOverrides::default())
    }

    fn stop(&mut self, timeout: Duration) -> Result<(), DaemonError> {
        let Some(mut process) = self.process.take() else {
            error!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                "tried to stop a non-running daemon"
            );
            return Ok(());
        };

        process.close_stdin();
        debug!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            timeout_secs = timeout.as_secs(),
            "waiting for process to exit"
        );
        if let Err(wait_error) = process.wait(Some(timeout)) {
            error!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                error = %wait_error,
                "error while waiting for process to exit"
            );
        }
        info!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "stopped"
        );
        Ok(())
    }

    fn restart(&mut self, overrides: &LaunchOverrides) -> Result<(), DaemonError> {
        info!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "restarting daemon"
        );
        self.restart_with(overrides)
    }

    fn restart_with_args(&mut self, extra_args: &[CommandArg]) -> Result<(), DaemonError> {
        info!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            extra_args = extra_args.len(),
            "restarting daemon with args"
        );
        self.restart_with(&LaunchOverrides::with_args(extra_args))
    }

    fn signal(&mut self, signal: Signal, silent: bool) -> Result<(), DaemonError> {
        self.write_control_byte(signal)?;
        if !silent {
            info!(
                target: PROCESS_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                signal = %signal,
                "sent signal"
            );
        }
        Ok(())
    }

    fn signal_delivery(&self) -> SignalDelivery {
        SignalDelivery::InBand
    }

    fn running(&self) -> Result<Option<Running>, DaemonError> {
        Ok(self.process.as_ref().map(|_| Running::Tracked))
    }

    fn reset(&mut self) {
        self.process = None;
    }

    fn wait(&mut self, timeout: Duration) -> Result<(), DaemonError> {
        let Some(mut process) = self.process.take() else {
            return Err(DaemonError::NotRunning {
                role: self.identity.role().to_owned(),
                id: self.identity.id().to_owned(),
            });
        };

        debug!(
            target: PROCESS_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "waiting for process to exit"
        );
        match process.wait(Some(timeout)) {
            Ok(exit_status) => {
                info!(
                    target: PROCESS_TARGET,
                    role = self.identity.role(),
                    id = self.identity.id(),
                    exit_status,
                    "stopped"
                );
                Ok(())
            }
            Err(wait_error) => {
                info!(
                    target: PROCESS_TARGET,
                    role = self.identity.role(),
                    id = self.identity.id(),
                    error = %wait_error,
                    "failed"
                );
                Err(wait_error.into())
            }
        }
    }

    fn wait_for_exit(&mut self) -> Result<(), DaemonError> {
        if let Some(mut process) = self.process.take() {
            process.wait(None)?;
        }
        Ok(())
    }

    fn check_status(&mut self) -> Result<Option<i32>, DaemonError> {
        match self.process.as_mut() {
            Some(process) => Ok(process.poll()?),
            None => Ok(None),
        }
    }
}
