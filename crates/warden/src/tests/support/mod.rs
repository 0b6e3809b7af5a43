//! Test doubles for the remote collaborator.

mod host;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockall::mock;

pub(crate) use host::{LaunchedDaemon, SimulatedHost};

use crate::daemon::DaemonIdentity;
use crate::process::ProcessDaemon;
use crate::remote::{Remote, RemoteError, RemoteProcess, RunRequest};
use crate::systemd::SystemdDaemon;
use crate::template::CommandTemplate;

mock! {
    pub(crate) Process {}
    impl RemoteProcess for Process {
        fn write_stdin(&mut self, bytes: &[u8]) -> Result<(), RemoteError>;
        fn close_stdin(&mut self);
        fn take_stdout(&mut self) -> String;
        fn poll(&mut self) -> Result<Option<i32>, RemoteError>;
        fn wait(&mut self, timeout: Option<Duration>) -> Result<i32, RemoteError>;
    }
}

impl fmt::Debug for MockProcess {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("MockProcess").finish_non_exhaustive()
    }
}

/// Hands out prepared process handles in order, one per `run`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRemote {
    handles: Mutex<Vec<Box<dyn RemoteProcess>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub(crate) fn with_handles(handles: Vec<Box<dyn RemoteProcess>>) -> Arc<Self> {
        let mut handles = handles;
        handles.reverse();
        Arc::new(Self {
            handles: Mutex::new(handles),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl Remote for ScriptedRemote {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(&self, request: RunRequest) -> Result<Box<dyn RemoteProcess>, RemoteError> {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(request.rendered());
        self.handles
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .pop()
            .ok_or_else(|| RemoteError::StdinClosed {
                command: request.rendered(),
            })
    }
}

pub(crate) const STOP_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn osd_template() -> CommandTemplate {
    CommandTemplate::background(["ceph-osd", "-f", "--cluster", "ceph", "-i", "3"])
}

pub(crate) fn process_daemon(remote: Arc<dyn Remote>) -> ProcessDaemon {
    ProcessDaemon::new(
        DaemonIdentity::new("osd", "3"),
        remote,
        osd_template(),
        STOP_TIMEOUT,
    )
}

pub(crate) fn systemd_daemon(remote: Arc<dyn Remote>, role: &str, id: &str) -> SystemdDaemon {
    SystemdDaemon::new(DaemonIdentity::new(role, id), remote, "ceph", 10)
}
