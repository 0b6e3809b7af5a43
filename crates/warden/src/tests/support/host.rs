//! A host double that records commands and mimics a service manager.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::remote::{Remote, RemoteError, RemoteProcess, RunRequest};

const ACTIVE_SHOW: &str = "ActiveState=active\nSubState=running\n";
const FIRST_PID: u32 = 4242;

#[derive(Debug)]
struct HostState {
    commands: Vec<String>,
    pid: Option<u32>,
    next_pid: u32,
    show_output: String,
    status_output: String,
    journal_output: Option<String>,
    failures: Vec<(String, i32)>,
    launched: Vec<LaunchedDaemon>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            pid: None,
            next_pid: FIRST_PID,
            show_output: ACTIVE_SHOW.to_owned(),
            status_output: String::new(),
            journal_output: Some(String::from("-- No entries --\n")),
            failures: Vec::new(),
            launched: Vec::new(),
        }
    }
}

/// Records every rendered command and answers unit, `ps`, and journal
/// queries from in-memory state. `systemctl start`/`restart` give the daemon
/// a new PID and `systemctl stop` clears it. Unknown commands are treated as
/// daemon launches and stay running until their stdin is closed.
#[derive(Debug, Default)]
pub(crate) struct SimulatedHost {
    state: Mutex<HostState>,
}

impl SimulatedHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Every command issued so far, rendered.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Commands containing `fragment`.
    pub(crate) fn commands_matching(&self, fragment: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|command| command.contains(fragment))
            .collect()
    }

    pub(crate) fn clear_commands(&self) {
        self.state().commands.clear();
    }

    /// Marks the unit's process as running with a fresh PID.
    pub(crate) fn spawn_unit_process(&self) -> u32 {
        let mut state = self.state();
        let pid = state.next_pid;
        state.pid = Some(pid);
        state.next_pid += 1;
        pid
    }

    pub(crate) fn kill_unit_process(&self) {
        self.state().pid = None;
    }

    pub(crate) fn unit_pid(&self) -> Option<u32> {
        self.state().pid
    }

    pub(crate) fn set_show_output(&self, text: &str) {
        text.clone_into(&mut self.state().show_output);
    }

    pub(crate) fn set_status_output(&self, text: &str) {
        text.clone_into(&mut self.state().status_output);
    }

    pub(crate) fn set_journal_output(&self, text: Option<&str>) {
        self.state().journal_output = text.map(str::to_owned);
    }

    /// Fails commands containing `fragment` with `exit_status` when they run
    /// under strict status checking.
    pub(crate) fn fail_commands_matching(&self, fragment: &str, exit_status: i32) {
        self.state()
            .failures
            .push((fragment.to_owned(), exit_status));
    }

    /// Daemons launched directly, oldest first.
    pub(crate) fn launched(&self) -> Vec<LaunchedDaemon> {
        self.state().launched.clone()
    }

    pub(crate) fn last_launched(&self) -> LaunchedDaemon {
        self.launched()
            .pop()
            .unwrap_or_else(|| panic!("no daemon was launched"))
    }

    fn answer(state: &mut HostState, command: &str) -> Option<String> {
        if command.starts_with("ps -ef") {
            return Some(state.pid.map(|pid| format!("{pid}\n")).unwrap_or_default());
        }
        if command.contains("systemctl start") || command.contains("systemctl restart") {
            state.pid = Some(state.next_pid);
            state.next_pid += 1;
            return Some(String::new());
        }
        if command.contains("systemctl stop") {
            state.pid = None;
            return Some(String::new());
        }
        if command.contains("systemctl show") {
            return Some(state.show_output.clone());
        }
        if command.contains("systemctl status") {
            return Some(state.status_output.clone());
        }
        if command.contains("journalctl") {
            return state.journal_output.clone();
        }
        if command.starts_with("sudo kill") {
            return Some(String::new());
        }
        None
    }
}

impl Remote for SimulatedHost {
    fn name(&self) -> &str {
        "simulated"
    }

    fn run(&self, request: RunRequest) -> Result<Box<dyn RemoteProcess>, RemoteError> {
        let command = request.rendered();
        let options = request.options().clone();
        let mut state = self.state();
        state.commands.push(command.clone());

        let failure = state
            .failures
            .iter()
            .find(|(fragment, _)| command.contains(fragment.as_str()))
            .map(|(_, exit_status)| *exit_status);
        if let Some(exit_status) = failure
            && options.checks_status()
        {
            return Err(RemoteError::CommandFailed {
                command,
                exit_status,
                remote: self.name().to_owned(),
            });
        }

        if command.contains("journalctl") && state.journal_output.is_none() {
            return Err(RemoteError::Timeout {
                command,
                remote: self.name().to_owned(),
                timeout_secs: 0,
            });
        }

        if let Some(stdout) = Self::answer(&mut state, &command) {
            let stdout = if options.captures_stdout() {
                stdout
            } else {
                String::new()
            };
            return Ok(Box::new(SimulatedProcess::finished(command, stdout)));
        }

        let daemon = LaunchedDaemon::new(command, options.checks_status());
        state.launched.push(daemon.clone());
        Ok(Box::new(SimulatedProcess {
            daemon,
            stdout: String::new(),
        }))
    }
}

#[derive(Debug, Default)]
struct LaunchedState {
    command: String,
    check_status: bool,
    stdin: Vec<u8>,
    stdin_closed: bool,
    exit_status: Option<i32>,
    wait_failure: Option<RemoteError>,
    waits: usize,
}

/// Shared view of a directly launched daemon.
#[derive(Debug, Clone)]
pub(crate) struct LaunchedDaemon {
    state: Arc<Mutex<LaunchedState>>,
}

impl LaunchedDaemon {
    fn new(command: String, check_status: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(LaunchedState {
                command,
                check_status,
                ..LaunchedState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LaunchedState> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    pub(crate) fn command(&self) -> String {
        self.state().command.clone()
    }

    pub(crate) fn stdin(&self) -> Vec<u8> {
        self.state().stdin.clone()
    }

    pub(crate) fn stdin_closed(&self) -> bool {
        self.state().stdin_closed
    }

    pub(crate) fn waits(&self) -> usize {
        self.state().waits
    }

    /// Makes the daemon exit on its own with `exit_status`.
    pub(crate) fn exit(&self, exit_status: i32) {
        self.state().exit_status = Some(exit_status);
    }

    /// Makes the next wait fail with `error`.
    pub(crate) fn fail_next_wait(&self, error: RemoteError) {
        self.state().wait_failure = Some(error);
    }
}

#[derive(Debug)]
struct SimulatedProcess {
    daemon: LaunchedDaemon,
    stdout: String,
}

impl SimulatedProcess {
    fn finished(command: String, stdout: String) -> Self {
        let daemon = LaunchedDaemon::new(command, true);
        daemon.exit(0);
        Self { daemon, stdout }
    }

    fn checked(state: &LaunchedState, exit_status: i32) -> Result<i32, RemoteError> {
        if state.check_status && exit_status != 0 {
            return Err(RemoteError::CommandFailed {
                command: state.command.clone(),
                exit_status,
                remote: String::from("simulated"),
            });
        }
        Ok(exit_status)
    }
}

impl RemoteProcess for SimulatedProcess {
    fn write_stdin(&mut self, bytes: &[u8]) -> Result<(), RemoteError> {
        let mut state = self.daemon.state();
        if state.stdin_closed {
            return Err(RemoteError::StdinClosed {
                command: state.command.clone(),
            });
        }
        state.stdin.extend_from_slice(bytes);
        Ok(())
    }

    fn close_stdin(&mut self) {
        let mut state = self.daemon.state();
        state.stdin_closed = true;
        if state.exit_status.is_none() {
            state.exit_status = Some(0);
        }
    }

    fn take_stdout(&mut self) -> String {
        std::mem::take(&mut self.stdout)
    }

    fn poll(&mut self) -> Result<Option<i32>, RemoteError> {
        let state = self.daemon.state();
        state
            .exit_status
            .map(|exit_status| Self::checked(&state, exit_status))
            .transpose()
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<i32, RemoteError> {
        let mut state = self.daemon.state();
        state.waits += 1;
        if let Some(failure) = state.wait_failure.take() {
            return Err(failure);
        }
        match (state.exit_status, timeout) {
            (Some(exit_status), _) => Self::checked(&state, exit_status),
            (None, Some(timeout)) => Err(RemoteError::Timeout {
                command: state.command.clone(),
                remote: String::from("simulated"),
                timeout_secs: timeout.as_secs(),
            }),
            (None, None) => {
                state.exit_status = Some(0);
                Ok(0)
            }
        }
    }
}
