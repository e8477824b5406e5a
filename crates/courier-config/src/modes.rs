//! Small closed sets of behaviour switches.
//!
//! Each parses case-insensitively from its `snake_case` name, which is also
//! the form used in configuration files and environment variables.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the per-connection idle timer treats inbound traffic.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IdlePolicy {
    /// Every received chunk restarts the timer, so only silence closes the
    /// connection.
    #[default]
    ResetOnActivity,
    /// The timer runs from accept regardless of traffic.
    Absolute,
}

/// Rendering of daemon log events on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}

/// Error returned when text names none of a switch's variants.
pub type ModeParseError = strum::ParseError;
