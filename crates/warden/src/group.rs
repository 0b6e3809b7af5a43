//! Registry of the daemon instances an orchestrator controls.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use warden_config::{Config, ControlMode};

use crate::daemon::{DaemonControl, DaemonIdentity};
use crate::error::DaemonError;
use crate::process::ProcessDaemon;
use crate::remote::Remote;
use crate::systemd::SystemdDaemon;
use crate::template::{CommandTemplate, LaunchOverrides};

/// Log target for registry events.
const GROUP_TARGET: &str = "warden::group";

/// Daemon controls keyed by role and id, all built for one control mode.
#[derive(Debug)]
pub struct DaemonGroup {
    mode: ControlMode,
    stop_timeout: Duration,
    unit_prefix: String,
    journal_lines: u32,
    daemons: BTreeMap<DaemonIdentity, Box<dyn DaemonControl>>,
}

impl DaemonGroup {
    /// Builds an empty group using the control settings in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.control_mode(),
            stop_timeout: config.stop_timeout(),
            unit_prefix: config.unit_prefix().to_owned(),
            journal_lines: config.journal_lines(),
            daemons: BTreeMap::new(),
        }
    }

    /// Control mode used for new registrations.
    #[must_use]
    pub const fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Registers the daemon `role`.`id`, replacing any existing entry.
    ///
    /// A replaced daemon is stopped first. `template` is only used by
    /// process-backed daemons.
    ///
    /// # Errors
    ///
    /// Returns the error raised while stopping a replaced daemon; the new
    /// entry is not registered in that case.
    pub fn register_daemon(
        &mut self,
        remote: Arc<dyn Remote>,
        role: &str,
        id: &str,
        template: CommandTemplate,
    ) -> Result<&mut dyn DaemonControl, DaemonError> {
        let identity = DaemonIdentity::new(role, id);
        if let Some(existing) = self.daemons.get_mut(&identity) {
            info!(
                target: GROUP_TARGET,
                role,
                id,
                "replacing registered daemon"
            );
            existing.stop(self.stop_timeout)?;
        }
        let control = self.build(identity.clone(), remote, template);
        debug!(target: GROUP_TARGET, role, id, mode = %self.mode, "registered daemon");
        let slot = match self.daemons.entry(identity) {
            Entry::Vacant(vacant) => vacant.insert(control),
            Entry::Occupied(mut occupied) => {
                occupied.insert(control);
                occupied.into_mut()
            }
        };
        let daemon: &mut dyn DaemonControl = slot.as_mut();
        Ok(daemon)
    }

    /// Registers the daemon `role`.`id` and starts it.
    ///
    /// # Errors
    ///
    /// Returns the registration error or the error raised by the launch.
    pub fn add_daemon(
        &mut self,
        remote: Arc<dyn Remote>,
        role: &str,
        id: &str,
        template: CommandTemplate,
    ) -> Result<&mut dyn DaemonControl, DaemonError> {
        let control = self.register_daemon(remote, role, id, template)?;
        control.restart(&LaunchOverrides::default())?;
        Ok(control)
    }

    /// Looks up the daemon `role`.`id`.
    #[must_use]
    pub fn get(&self, role: &str, id: &str) -> Option<&dyn DaemonControl> {
        self.daemons
            .get(&DaemonIdentity::new(role, id))
            .map(|daemon| &**daemon)
    }

    /// Looks up the daemon `role`.`id` for a lifecycle operation.
    pub fn get_mut(&mut self, role: &str, id: &str) -> Option<&mut dyn DaemonControl> {
        let daemon: &mut dyn DaemonControl =
            self.daemons.get_mut(&DaemonIdentity::new(role, id))?.as_mut();
        Some(daemon)
    }

    /// Daemons whose role ends in `kind`, ordered by role and id.
    pub fn daemons_of_kind<'group>(
        &'group self,
        kind: &'group str,
    ) -> impl Iterator<Item = &'group dyn DaemonControl> {
        self.daemons
            .iter()
            .filter(move |(identity, _)| identity.kind() == kind)
            .map(|(_, daemon)| &**daemon)
    }

    /// Removes the daemon `role`.`id` without stopping it.
    pub fn remove(&mut self, role: &str, id: &str) -> Option<Box<dyn DaemonControl>> {
        self.daemons.remove(&DaemonIdentity::new(role, id))
    }

    /// Number of registered daemons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.daemons.len()
    }

    /// Whether no daemon is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daemons.is_empty()
    }

    fn build(
        &self,
        identity: DaemonIdentity,
        remote: Arc<dyn Remote>,
        template: CommandTemplate,
    ) -> Box<dyn DaemonControl> {
        match self.mode {
            ControlMode::Process => Box::new(ProcessDaemon::new(
                identity,
                remote,
                template,
                self.stop_timeout,
            )),
            ControlMode::Systemd => Box::new(SystemdDaemon::new(
                identity,
                remote,
                &self.unit_prefix,
                self.journal_lines,
            )),
        }
    }
}
