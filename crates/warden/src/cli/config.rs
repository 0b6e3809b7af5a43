//! Separates configuration flags from the command line.
//!
//! Configuration flags must precede the subcommand. They are handed to
//! `ortho_config` while everything from the subcommand onwards goes to clap.

use std::ffi::{OsStr, OsString};

/// Flags understood by the configuration loader.
///
/// Keep in sync with the fields of `warden_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--control-mode",
    "--stop-timeout-secs",
    "--unit-prefix",
    "--journal-lines",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments for the configuration loader and for the command parser. Both
/// start with the program name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 0usize;
    while let Some(argument) = rest.get(index) {
        let FlagAction::Include { needs_value } = classify(argument) else {
            break;
        };
        config_arguments.push(argument.clone());
        index += 1;
        if needs_value && let Some(value) = rest.get(index) {
            config_arguments.push(value.clone());
            index += 1;
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(rest.iter().skip(index).cloned());
    ArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
