//! Response envelope written back for every admitted or rejected request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::unix_millis;

/// Outcome marker of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The method completed and `result` holds its output.
    Ok,
    /// The request failed; `error` holds the message text.
    Error,
}

/// Response frame correlated to a request by `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome marker.
    pub status: Status,
    /// Method output, or `null` on failure.
    #[serde(default)]
    pub result: Value,
    /// Identifier echoed from the request header, or `null` when unknown.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Server time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    /// Error message text, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub fn ok(request_id: Option<String>, result: Value) -> Self {
        Self {
            status: Status::Ok,
            result,
            request_id,
            timestamp: unix_millis(),
            error: None,
        }
    }

    /// Builds a failure response carrying `message`.
    #[must_use]
    pub fn error(request_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            result: Value::Null,
            request_id,
            timestamp: unix_millis(),
            error: Some(message.into()),
        }
    }

    /// Returns `true` for an `OK` response.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
