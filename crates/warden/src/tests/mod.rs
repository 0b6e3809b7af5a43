//! Test suites for daemon lifecycle control.

mod support;
