//! Launch templates for directly spawned daemons.
//!
//! A [`CommandTemplate`] is fixed when the daemon is registered. Restarts
//! derive a fresh [`RunRequest`] from it, overlaying per-call
//! [`LaunchOverrides`]; the template itself never changes, so extra arguments
//! given to one restart do not leak into the next.

use crate::remote::{CommandArg, RunOptions, RunRequest};

/// Arguments and options used to (re)launch a daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTemplate {
    args: Vec<CommandArg>,
    options: RunOptions,
}

impl CommandTemplate {
    /// Creates a template from launch arguments and run options.
    #[must_use]
    pub fn new(args: Vec<CommandArg>, options: RunOptions) -> Self {
        Self { args, options }
    }

    /// Creates a template for a background daemon fed through stdin.
    #[must_use]
    pub fn background<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<CommandArg>,
    {
        Self::new(
            args.into_iter().map(Into::into).collect(),
            RunOptions::background(),
        )
    }

    /// Stored launch arguments.
    #[must_use]
    pub fn args(&self) -> &[CommandArg] {
        &self.args
    }

    /// Stored run options.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Builds the request for one launch with `overrides` applied.
    #[must_use]
    pub fn launch_request(&self, overrides: &LaunchOverrides) -> RunRequest {
        let mut args = self.args.clone();
        args.extend(overrides.args.iter().cloned());
        RunRequest::new(args, self.options.merged(&overrides.options))
    }
}

/// Per-call additions to a [`CommandTemplate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOverrides {
    /// Arguments appended after the template's arguments.
    pub args: Vec<CommandArg>,
    /// Options overlaid on the template's options.
    pub options: RunOptions,
}

impl LaunchOverrides {
    /// Overrides that only append arguments.
    #[must_use]
    pub fn with_args(args: &[CommandArg]) -> Self {
        Self {
            args: args.to_vec(),
            options: RunOptions::default(),
        }
    }

    /// Whether these overrides change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.options == RunOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osd_template() -> CommandTemplate {
        CommandTemplate::background(["ceph-osd", "-f", "-i", "0"])
    }

    #[test]
    fn launch_without_overrides_reuses_the_template() {
        let template = osd_template();
        let request = template.launch_request(&LaunchOverrides::default());
        assert_eq!(request.rendered(), "ceph-osd -f -i 0");
        assert_eq!(request.options(), template.options());
    }

    #[test]
    fn overrides_apply_to_one_launch_only() {
        let template = osd_template();
        let overrides = LaunchOverrides {
            args: vec![CommandArg::quoted("--debug-osd=20")],
            options: RunOptions::default().with_check_status(false),
        };

        let first = template.launch_request(&overrides);
        let second = template.launch_request(&LaunchOverrides::default());

        assert_eq!(first.rendered(), "ceph-osd -f -i 0 --debug-osd=20");
        assert_eq!(first.options().check_status, Some(false));
        assert_eq!(second.rendered(), "ceph-osd -f -i 0");
        assert_eq!(second.options().check_status, None);
    }

    #[test]
    fn argument_only_overrides_are_not_empty() {
        assert!(LaunchOverrides::default().is_empty());
        assert!(!LaunchOverrides::with_args(&[CommandArg::quoted("--foreground")]).is_empty());
    }
}
