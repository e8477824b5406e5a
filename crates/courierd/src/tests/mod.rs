//! Test suites for the courier daemon.

mod stub;
pub(crate) mod support;
