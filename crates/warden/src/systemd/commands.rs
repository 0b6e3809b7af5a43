//! Shell commands issued to a host's service manager.

use strum::Display;

use crate::daemon::DaemonIdentity;
use crate::remote::CommandArg;

/// Unit actions understood by `systemctl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UnitAction {
    /// Start the unit.
    Start,
    /// Stop the unit.
    Stop,
    /// Restart the unit.
    Restart,
    /// Print unit properties as `key=value` lines.
    Show,
    /// Print human-readable unit status and recent log lines.
    Status,
}

/// Builds `sudo systemctl {action} {family}@{instance}` for a daemon kind.
///
/// The `rgw` kind runs under the `radosgw` family with its instance
/// namespaced as `rgw.<id>`; every other kind maps to `<prefix>-<kind>`.
#[must_use]
pub fn unit_command(action: UnitAction, prefix: &str, kind: &str, id: &str) -> String {
    let (family, instance) = match kind {
        "rgw" => ("radosgw", format!("rgw.{id}")),
        other => (other, id.to_owned()),
    };
    format!("sudo systemctl {action} {prefix}-{family}@{instance}")
}

/// Builds the journal query used to dump recent output of a unit.
#[must_use]
pub fn journal_command(role: &str, id: &str, lines: u32) -> String {
    let unit = role.replace('.', "-");
    format!("sudo journalctl -u {unit}@{id} -t {unit} -n {lines}")
}

/// Builds the pipeline printing the PID of the daemon's process.
///
/// Matches processes whose command line contains `<prefix>-<kind>` followed
/// by `--id <id>`, drops the `grep` itself, and prints the PID column.
#[must_use]
pub fn pid_lookup_args(prefix: &str, kind: &str, id: &str) -> Vec<CommandArg> {
    vec![
        CommandArg::quoted("ps"),
        CommandArg::quoted("-ef"),
        CommandArg::raw("|"),
        CommandArg::quoted("grep"),
        CommandArg::raw(format!("\"{prefix}-{kind}.*--id {id}\"")),
        CommandArg::raw("|"),
        CommandArg::quoted("grep"),
        CommandArg::quoted("-v"),
        CommandArg::quoted("grep"),
        CommandArg::raw("|"),
        CommandArg::quoted("awk"),
        CommandArg::raw("{'print $2'}"),
    ]
}

/// Every command a unit-controlled daemon issues, rendered once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCommands {
    start: String,
    stop: String,
    restart: String,
    show: String,
    status: String,
    journal: String,
    pid_lookup: Vec<CommandArg>,
}

impl UnitCommands {
    /// Renders the commands for `identity`.
    #[must_use]
    pub fn new(identity: &DaemonIdentity, prefix: &str, journal_lines: u32) -> Self {
        let (kind, id) = (identity.kind(), identity.id());
        Self {
            start: unit_command(UnitAction::Start, prefix, kind, id),
            stop: unit_command(UnitAction::Stop, prefix, kind, id),
            restart: unit_command(UnitAction::Restart, prefix, kind, id),
            show: unit_command(UnitAction::Show, prefix, kind, id),
            status: unit_command(UnitAction::Status, prefix, kind, id),
            journal: journal_command(identity.role(), id, journal_lines),
            pid_lookup: pid_lookup_args(prefix, kind, id),
        }
    }

    /// Command for `action`.
    #[must_use]
    pub fn action(&self, action: UnitAction) -> &str {
        match action {
            UnitAction::Start => &self.start,
            UnitAction::Stop => &self.stop,
            UnitAction::Restart => &self.restart,
            UnitAction::Show => &self.show,
            UnitAction::Status => &self.status,
        }
    }

    /// `show` filtered to the state properties.
    #[must_use]
    pub fn state_query(&self) -> String {
        format!("{} | grep -i state", self.show)
    }

    /// `status` filtered to main-process exit lines.
    #[must_use]
    pub fn exit_query(&self) -> String {
        format!("{} | grep 'Main.*code=exited'", self.status)
    }

    /// Journal dump command.
    #[must_use]
    pub fn journal(&self) -> &str {
        &self.journal
    }

    /// PID lookup pipeline.
    #[must_use]
    pub fn pid_lookup(&self) -> &[CommandArg] {
        &self.pid_lookup
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::remote::render_command;

    #[rstest]
    #[case(UnitAction::Start, "osd", "3", "sudo systemctl start ceph-osd@3")]
    #[case(UnitAction::Stop, "mon", "a", "sudo systemctl stop ceph-mon@a")]
    #[case(UnitAction::Restart, "mds", "b", "sudo systemctl restart ceph-mds@b")]
    #[case(UnitAction::Show, "mgr", "x", "sudo systemctl show ceph-mgr@x")]
    #[case(UnitAction::Status, "osd", "0", "sudo systemctl status ceph-osd@0")]
    #[case(UnitAction::Start, "rgw", "a", "sudo systemctl start ceph-radosgw@rgw.a")]
    fn unit_commands_follow_the_template(
        #[case] action: UnitAction,
        #[case] kind: &str,
        #[case] id: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(unit_command(action, "ceph", kind, id), expected);
    }

    #[test]
    fn journal_command_dashes_the_role() {
        assert_eq!(
            journal_command("ceph.osd", "3", 10),
            "sudo journalctl -u ceph-osd@3 -t ceph-osd -n 10"
        );
    }

    #[test]
    fn pid_lookup_renders_the_pipeline() {
        assert_eq!(
            render_command(&pid_lookup_args("ceph", "osd", "3")),
            "ps -ef | grep \"ceph-osd.*--id 3\" | grep -v grep | awk {'print $2'}"
        );
    }

    #[test]
    fn rgw_pid_lookup_keeps_the_role_kind() {
        let rendered = render_command(&pid_lookup_args("ceph", "rgw", "a"));
        assert!(rendered.contains("\"ceph-rgw.*--id a\""), "{rendered}");
    }

    #[test]
    fn unit_commands_render_queries() {
        let commands = UnitCommands::new(&DaemonIdentity::new("ceph.osd", "3"), "ceph", 10);
        assert_eq!(
            commands.state_query(),
            "sudo systemctl show ceph-osd@3 | grep -i state"
        );
        assert_eq!(
            commands.exit_query(),
            "sudo systemctl status ceph-osd@3 | grep 'Main.*code=exited'"
        );
        assert_eq!(
            commands.action(UnitAction::Start),
            "sudo systemctl start ceph-osd@3"
        );
        assert_eq!(
            commands.journal(),
            "sudo journalctl -u ceph-osd@3 -t ceph-osd -n 10"
        );
    }
}
