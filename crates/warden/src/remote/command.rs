//! Shell command construction for remote execution.
//!
//! Commands are assembled from [`CommandArg`] values. Quoted arguments are
//! escaped for a POSIX shell; raw arguments (pipes, redirections, embedded
//! quoting) pass through untouched. [`RunOptions`] carries the keyword
//! settings that accompany a command and supports per-call overlays through
//! [`RunOptions::merged`].

use std::collections::BTreeMap;
use std::fmt;

/// A single argument of a remote shell command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandArg {
    /// Literal argument; escaped when rendered.
    Quoted(String),
    /// Shell fragment inserted verbatim.
    Raw(String),
}

impl CommandArg {
    /// Builds an argument that is escaped when rendered.
    #[must_use]
    pub fn quoted(value: impl Into<String>) -> Self {
        Self::Quoted(value.into())
    }

    /// Builds a shell fragment that is rendered verbatim.
    #[must_use]
    pub fn raw(value: impl Into<String>) -> Self {
        Self::Raw(value.into())
    }

    /// Renders the argument as it appears on the shell command line.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Quoted(value) => quote(value),
            Self::Raw(value) => value.clone(),
        }
    }
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        Self::quoted(value)
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        Self::Quoted(value)
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.render())
    }
}

/// Renders a list of arguments into a single shell command string.
#[must_use]
pub fn render_command(args: &[CommandArg]) -> String {
    args.iter()
        .map(CommandArg::render)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_shell_safe(character: char) -> bool {
    character.is_ascii_alphanumeric() || "@%+=:,./_-".contains(character)
}

/// Escapes `value` for a POSIX shell using single quotes.
fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.to_owned();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// Keyword settings that accompany a remote command.
///
/// Unset fields fall back to the collaborator defaults exposed by the
/// accessor methods. Overlays are applied with [`RunOptions::merged`], which
/// never mutates the receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Fail with `CommandFailed` when the command exits non-zero.
    pub check_status: Option<bool>,
    /// Block in `run` until the command completes.
    pub wait: Option<bool>,
    /// Capture standard output for later retrieval.
    pub capture_stdout: Option<bool>,
    /// Keep a writable pipe to the command's standard input.
    pub stdin_pipe: Option<bool>,
    /// Label used in log output instead of the rendered command.
    pub label: Option<String>,
    /// Environment variables exported for the command.
    pub env: BTreeMap<String, String>,
}

impl RunOptions {
    /// Options for a command that runs to completion and reports its output.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            capture_stdout: Some(true),
            ..Self::default()
        }
    }

    /// Options for a long-running process controlled through its stdin.
    #[must_use]
    pub fn background() -> Self {
        Self {
            wait: Some(false),
            stdin_pipe: Some(true),
            ..Self::default()
        }
    }

    /// Returns a copy with strict status checking set to `check`.
    #[must_use]
    pub fn with_check_status(mut self, check: bool) -> Self {
        self.check_status = Some(check);
        self
    }

    /// Returns a copy labelled for log output.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns a copy exporting `key=value` to the command.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Overlays `overrides` onto a copy of these options.
    ///
    /// Fields set in `overrides` win; environment maps are unioned with the
    /// override's values taking precedence.
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut env = self.env.clone();
        env.extend(
            overrides
                .env
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self {
            check_status: overrides.check_status.or(self.check_status),
            wait: overrides.wait.or(self.wait),
            capture_stdout: overrides.capture_stdout.or(self.capture_stdout),
            stdin_pipe: overrides.stdin_pipe.or(self.stdin_pipe),
            label: overrides.label.clone().or_else(|| self.label.clone()),
            env,
        }
    }

    /// Whether a non-zero exit is reported as `CommandFailed` (default `true`).
    #[must_use]
    pub fn checks_status(&self) -> bool {
        self.check_status.unwrap_or(true)
    }

    /// Whether `run` blocks until completion (default `true`).
    #[must_use]
    pub fn waits(&self) -> bool {
        self.wait.unwrap_or(true)
    }

    /// Whether standard output is captured (default `false`).
    #[must_use]
    pub fn captures_stdout(&self) -> bool {
        self.capture_stdout.unwrap_or(false)
    }

    /// Whether standard input stays writable (default `false`).
    #[must_use]
    pub fn pipes_stdin(&self) -> bool {
        self.stdin_pipe.unwrap_or(false)
    }
}

/// A command plus the options it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    args: Vec<CommandArg>,
    options: RunOptions,
}

impl RunRequest {
    /// Creates a request from arguments and options.
    #[must_use]
    pub fn new(args: Vec<CommandArg>, options: RunOptions) -> Self {
        Self { args, options }
    }

    /// Creates a request for a pre-rendered shell string.
    #[must_use]
    pub fn shell(command: impl Into<String>, options: RunOptions) -> Self {
        Self::new(vec![CommandArg::raw(command)], options)
    }

    /// Command arguments.
    #[must_use]
    pub fn args(&self) -> &[CommandArg] {
        &self.args
    }

    /// Run options.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// The command as a single shell string.
    #[must_use]
    pub fn rendered(&self) -> String {
        render_command(&self.args)
    }

    /// Name used in log output: the label when set, else the command.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.options
            .label
            .clone()
            .unwrap_or_else(|| self.rendered())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("osd", "osd")]
    #[case("--id", "--id")]
    #[case("ceph-osd@3", "ceph-osd@3")]
    #[case("two words", "'two words'")]
    #[case("", "''")]
    #[case("it's", r#"'it'"'"'s'"#)]
    #[case("$HOME", "'$HOME'")]
    fn quoted_arguments_are_escaped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CommandArg::quoted(input).render(), expected);
    }

    #[test]
    fn raw_arguments_pass_through() {
        let args = vec![
            CommandArg::quoted("ps"),
            CommandArg::quoted("-ef"),
            CommandArg::raw("|"),
            CommandArg::quoted("grep"),
            CommandArg::raw("\"ceph-osd.*--id 3\""),
        ];
        assert_eq!(render_command(&args), "ps -ef | grep \"ceph-osd.*--id 3\"");
    }

    #[test]
    fn merged_prefers_override_fields() {
        let base = RunOptions::background()
            .with_label("osd.0")
            .with_env("CEPH_ARGS", "--debug");
        let overrides = RunOptions {
            check_status: Some(false),
            ..RunOptions::default()
        }
        .with_env("TZ", "UTC");

        let merged = base.merged(&overrides);

        assert_eq!(merged.check_status, Some(false));
        assert_eq!(merged.wait, Some(false));
        assert_eq!(merged.label.as_deref(), Some("osd.0"));
        assert_eq!(merged.env.len(), 2);
        assert_eq!(base.check_status, None, "base must not be mutated");
        assert_eq!(base.env.len(), 1, "base env must not be mutated");
    }

    #[test]
    fn defaults_follow_collaborator_conventions() {
        let options = RunOptions::default();
        assert!(options.checks_status());
        assert!(options.waits());
        assert!(!options.captures_stdout());
        assert!(!options.pipes_stdin());
    }

    #[test]
    fn display_name_uses_label_when_present() {
        let request = RunRequest::shell("sleep 30", RunOptions::default().with_label("sleeper"));
        assert_eq!(request.display_name(), "sleeper");
        assert_eq!(request.rendered(), "sleep 30");
    }
}
