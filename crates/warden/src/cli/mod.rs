//! Runtime behind the `warden` binary.
//!
//! The binary always drives a [`SystemdDaemon`]: a process-backed daemon
//! cannot outlive the short-lived CLI process that would own its handle, so
//! `control_mode` does not apply here.

mod args;
mod config;

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ortho_config::OrthoConfig;
use thiserror::Error;
use warden_config::Config;

use self::args::{Action, Cli};
use self::config::split_arguments;
use crate::daemon::{DaemonControl, DaemonIdentity};
use crate::error::DaemonError;
use crate::remote::{LocalRemote, Remote};
use crate::systemd::SystemdDaemon;
use crate::telemetry::{self, TelemetryError};
use crate::template::LaunchOverrides;

/// Failures reported by the `warden` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    /// Telemetry could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The daemon operation failed.
    #[error(transparent)]
    Daemon(#[from] DaemonError),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Runs the CLI against the local host.
///
/// Usage errors and failures are written to `stderr`; the exit code is
/// `0` on success and `1` otherwise.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_remote(args, Arc::new(LocalRemote::new()), stdout, stderr)
}

pub(crate) fn run_with_remote<I, W, E>(
    args: I,
    remote: Arc<dyn Remote>,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);
    let cli = match Cli::try_parse_from(split.command_arguments) {
        Ok(cli) => cli,
        Err(usage) if usage.use_stderr() => {
            write!(stderr, "{}", usage.render()).ok();
            return ExitCode::FAILURE;
        }
        Err(help) => {
            write!(stdout, "{}", help.render()).ok();
            return ExitCode::SUCCESS;
        }
    };

    let result = Config::load_from_iter(split.config_arguments)
        .map_err(CliError::LoadConfiguration)
        .and_then(|config| {
            telemetry::initialise(&config)?;
            execute(&cli.action, &config, remote, stdout)
        });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(stderr, "warden: {error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    action: &Action,
    config: &Config,
    remote: Arc<dyn Remote>,
    stdout: &mut W,
) -> Result<(), CliError> {
    let target = action.target();
    let mut daemon = SystemdDaemon::new(
        DaemonIdentity::new(target.role.as_str(), target.id.as_str()),
        remote,
        config.unit_prefix(),
        config.journal_lines(),
    );
    let identity = daemon.identity().clone();

    match action {
        Action::Start(_) => {
            daemon.start(config.stop_timeout())?;
            writeln!(stdout, "{identity}: started")?;
        }
        Action::Stop(_) => {
            daemon.stop(config.stop_timeout())?;
            writeln!(stdout, "{identity}: stopped")?;
        }
        Action::Restart(_) => {
            daemon.restart(&LaunchOverrides::default())?;
            writeln!(stdout, "{identity}: restarted")?;
        }
        Action::Status(_) => {
            if let Some(pid) = daemon.running()?.and_then(|running| running.pid()) {
                writeln!(stdout, "{identity}: running (pid {pid})")?;
            } else {
                match daemon.check_status()? {
                    None => writeln!(stdout, "{identity}: active")?,
                    Some(exit_status) => {
                        writeln!(stdout, "{identity}: exited with status {exit_status}")?;
                    }
                }
            }
        }
        Action::Pid(_) => {
            let pid = daemon.pid()?.ok_or_else(|| DaemonError::PidUnavailable {
                role: identity.role().to_owned(),
                id: identity.id().to_owned(),
            })?;
            writeln!(stdout, "{pid}")?;
        }
        Action::Signal { signal, .. } => {
            daemon.signal(*signal, false)?;
            writeln!(stdout, "{identity}: sent {signal}")?;
        }
    }
    Ok(())
}
