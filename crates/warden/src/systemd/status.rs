//! Parsers for service manager output.
//!
//! These functions take raw command output and return structured values so
//! they can be exercised without a host.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// `ActiveState` value of a healthy unit.
pub const ACTIVE: &str = "active";

/// Matches a main-process exit line and captures its status.
static EXIT_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"Main.*code=exited.*status=(\d+)").ok());

/// Errors raised while interpreting service manager output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusParseError {
    /// A required property was absent from `systemctl show` output.
    #[error("property '{0}' missing from unit properties")]
    MissingProperty(&'static str),
    /// No line reported how the main process exited.
    #[error("no main-process exit line in unit status")]
    MissingExitLine,
}

/// State properties of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitState {
    /// High-level state such as `active`, `inactive`, or `failed`.
    pub active_state: String,
    /// Low-level state such as `running`, `dead`, or `failed`.
    pub sub_state: String,
}

impl UnitState {
    /// Whether the unit is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_state == ACTIVE
    }
}

/// Parses `key=value` lines into a map.
///
/// Keys and values are trimmed; the value is everything after the first `=`.
/// Lines without `=` are ignored and later keys overwrite earlier ones.
#[must_use]
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

/// Extracts `ActiveState` and `SubState` from `systemctl show` output.
///
/// # Errors
///
/// Returns [`StatusParseError::MissingProperty`] when either property is
/// absent.
pub fn parse_show_output(text: &str) -> Result<UnitState, StatusParseError> {
    let mut properties = parse_properties(text);
    let active_state = properties
        .remove("ActiveState")
        .ok_or(StatusParseError::MissingProperty("ActiveState"))?;
    let sub_state = properties
        .remove("SubState")
        .ok_or(StatusParseError::MissingProperty("SubState"))?;
    Ok(UnitState {
        active_state,
        sub_state,
    })
}

/// Extracts the main process exit status from `systemctl status` output.
///
/// Only the last line matching `Main…code=exited…status=N` counts, so
/// earlier exits of a restarted unit are ignored.
///
/// # Errors
///
/// Returns [`StatusParseError::MissingExitLine`] when no line matches.
pub fn parse_exit_status(text: &str) -> Result<i32, StatusParseError> {
    let pattern = EXIT_LINE.as_ref().ok_or(StatusParseError::MissingExitLine)?;
    text.lines()
        .rev()
        .find_map(|line| pattern.captures(line))
        .and_then(|captures| captures.get(1))
        .and_then(|status| status.as_str().parse().ok())
        .ok_or(StatusParseError::MissingExitLine)
}

/// Parses the output of the PID lookup pipeline.
///
/// Returns `None` unless the trimmed output is a single positive integer;
/// several matching processes, or PID 0, therefore yield `None`.
#[must_use]
pub fn parse_pid(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok().filter(|pid| *pid > 0)
}
