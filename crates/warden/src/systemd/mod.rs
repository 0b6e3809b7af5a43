//! Daemons controlled through the host's service manager.
//!
//! [`SystemdDaemon`] holds no process handle. Every operation is a fresh
//! shell command on the daemon's host, and running state is recomputed from
//! the process table each time it is asked for.

mod commands;
mod status;

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tracing::{error, info, warn};

pub use commands::{UnitAction, UnitCommands, journal_command, pid_lookup_args, unit_command};
pub use status::{
    StatusParseError, UnitState, parse_exit_status, parse_pid, parse_properties,
    parse_show_output,
};

use crate::daemon::{DaemonControl, DaemonIdentity, Running, SignalDelivery};
use crate::error::DaemonError;
use crate::remote::{CommandArg, Remote, RunOptions, RunRequest};
use crate::template::LaunchOverrides;

/// Log target for unit-controlled daemons.
const SYSTEMD_TARGET: &str = "warden::systemd";

/// A daemon managed as a service unit.
#[derive(Debug)]
pub struct SystemdDaemon {
    identity: DaemonIdentity,
    remote: Arc<dyn Remote>,
    commands: UnitCommands,
}

impl SystemdDaemon {
    /// Creates a control for the unit serving `identity`.
    #[must_use]
    pub fn new(
        identity: DaemonIdentity,
        remote: Arc<dyn Remote>,
        unit_prefix: &str,
        journal_lines: u32,
    ) -> Self {
        let commands = UnitCommands::new(&identity, unit_prefix, journal_lines);
        Self {
            identity,
            remote,
            commands,
        }
    }

    /// Rendered unit commands.
    #[must_use]
    pub const fn commands(&self) -> &UnitCommands {
        &self.commands
    }

    /// Sends `signal` to the daemon's current PID with `kill`.
    ///
    /// The PID is looked up on every call. The service manager may restart
    /// the daemon afterwards, depending on the unit's restart policy.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::PidUnavailable`] when no process is found, or
    /// the failure of the lookup or `kill` command.
    pub fn kill(&self, signal: Signal, silent: bool) -> Result<(), DaemonError> {
        let pid = self
            .pid()?
            .filter(|pid| *pid > 0)
            .ok_or_else(|| DaemonError::PidUnavailable {
                role: self.identity.role().to_owned(),
                id: self.identity.id().to_owned(),
            })?;
        warn!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "systemd may restart daemons after kill signal"
        );
        if !silent {
            info!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                signal = %signal,
                pid,
                "sending signal"
            );
        }
        let command = format!("sudo kill -{} {pid}", signal as i32);
        self.remote
            .run(RunRequest::shell(command, RunOptions::default()))?;
        Ok(())
    }

    fn issue(&self, action: UnitAction) -> Result<(), DaemonError> {
        let command = self.commands.action(action).to_owned();
        info!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            command = %command,
            "issuing unit command"
        );
        self.remote
            .run(RunRequest::shell(command, RunOptions::default()))?;
        Ok(())
    }

    fn probe(&self, command: String) -> Result<String, DaemonError> {
        let options = RunOptions::default().with_check_status(false);
        Ok(self.remote.run_captured(RunRequest::shell(command, options))?)
    }

    fn status_parse_error(&self, source: StatusParseError) -> DaemonError {
        DaemonError::StatusParse {
            role: self.identity.role().to_owned(),
            id: self.identity.id().to_owned(),
            source,
        }
    }

    fn dump_journal(&self) {
        let request = RunRequest::shell(
            self.commands.journal(),
            RunOptions::default().with_check_status(false),
        );
        match self.remote.run_captured(request) {
            Ok(journal) => info!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                journal = %journal.trim_end(),
                "journal tail"
            ),
            Err(fetch_error) => warn!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                error = %fetch_error,
                "could not fetch journal"
            ),
        }
    }
}

impl DaemonControl for SystemdDaemon {
    fn identity(&self) -> &DaemonIdentity {
        &self.identity
    }

    fn pid(&self) -> Result<Option<u32>, DaemonError> {
        let request = RunRequest::new(self.commands.pid_lookup().to_vec(), RunOptions::default());
        let output = self.remote.run_captured(request)?;
        Ok(parse_pid(&output))
    }

    fn start(&mut self, _timeout: Duration) -> Result<(), DaemonError> {
        if self.is_running()? {
            warn!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                "restarting a running daemon"
            );
            return self.restart(&LaunchOverrides::default());
        }
        self.issue(UnitAction::Start)
    }

    fn stop(&mut self, _timeout: Duration) -> Result<(), DaemonError> {
        if !self.is_running()? {
            error!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                "tried to stop a non-running daemon"
            );
            return Ok(());
        }
        self.issue(UnitAction::Stop)?;
        info!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "stopped"
        );
        Ok(())
    }

    fn restart(&mut self, _overrides: &LaunchOverrides) -> Result<(), DaemonError> {
        if self.is_running()? {
            self.issue(UnitAction::Restart)
        } else {
            self.issue(UnitAction::Start)
        }
    }

    fn restart_with_args(&mut self, extra_args: &[CommandArg]) -> Result<(), DaemonError> {
        warn!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            extra_args = extra_args.len(),
            "restart with args not supported in systemd"
        );
        self.restart(&LaunchOverrides::default())
    }

    fn signal(&mut self, signal: Signal, silent: bool) -> Result<(), DaemonError> {
        self.kill(signal, silent)
    }

    fn signal_delivery(&self) -> SignalDelivery {
        SignalDelivery::OsKill
    }

    /// Looks the PID up on the host. A daemon that exits between this call
    /// and the next operation is reported as running until asked again.
    fn running(&self) -> Result<Option<Running>, DaemonError> {
        Ok(self.pid()?.filter(|pid| *pid > 0).map(Running::Pid))
    }

    fn reset(&mut self) {}

    fn wait(&mut self, _timeout: Duration) -> Result<(), DaemonError> {
        info!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "wait not supported in systemd"
        );
        Ok(())
    }

    fn wait_for_exit(&mut self) -> Result<(), DaemonError> {
        error!(
            target: SYSTEMD_TARGET,
            role = self.identity.role(),
            id = self.identity.id(),
            "wait_for_exit not supported in systemd"
        );
        Ok(())
    }

    fn check_status(&mut self) -> Result<Option<i32>, DaemonError> {
        let show = self.probe(self.commands.state_query())?;
        let state = parse_show_output(&show).map_err(|source| self.status_parse_error(source))?;
        if state.is_active() {
            return Ok(None);
        }

        let status = self.probe(self.commands.exit_query())?;
        let exit_status =
            parse_exit_status(&status).map_err(|source| self.status_parse_error(source))?;
        if exit_status != 0 {
            error!(
                target: SYSTEMD_TARGET,
                role = self.identity.role(),
                id = self.identity.id(),
                exit_status,
                sub_state = %state.sub_state,
                "daemon exited with failure"
            );
            self.dump_journal();
            return Err(DaemonError::CommandFailed {
                command: self.commands.action(UnitAction::Start).to_owned(),
                exit_status,
                remote: self.remote.name().to_owned(),
            });
        }
        Ok(Some(0))
    }
}
