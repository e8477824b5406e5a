//! Request envelope carried by every inbound frame.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::unix_millis;
use crate::codec::FrameError;

/// Method-specific request payload.
///
/// The transport treats the body as opaque; handlers validate the fields
/// they need.
pub type Body = Map<String, Value>;

/// Header fields present on every request.
///
/// All fields are optional on the wire so that a request lacking a
/// credential can still be parsed and rejected by the authenticator rather
/// than failing as a framing error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestHeader {
    /// Shared secret presented by the caller.
    pub auth_token: Option<String>,
    /// Name of the method to invoke.
    pub method: String,
    /// Caller-side timestamp in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Correlation identifier echoed in the response.
    pub request_id: Option<String>,
}

/// A complete protocol data unit: header plus body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    /// Routing, credential, and correlation fields.
    pub header: RequestHeader,
    /// Method arguments.
    pub body: Body,
}

impl Request {
    /// Builds a request stamped with the current time.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        auth_token: impl Into<String>,
        request_id: impl Into<String>,
        body: Body,
    ) -> Self {
        Self {
            header: RequestHeader {
                auth_token: Some(auth_token.into()),
                method: method.into(),
                timestamp: unix_millis(),
                request_id: Some(request_id.into()),
            },
            body,
        }
    }

    /// Parses a raw frame (without its terminator) into a request.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidUtf8`] when the frame is not UTF-8 and
    /// [`FrameError::Malformed`] when it is not a JSON object matching the
    /// request envelope.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(frame).map_err(|source| FrameError::InvalidUtf8 { source })?;
        serde_json::from_str(text.trim()).map_err(|source| FrameError::Malformed { source })
    }

    /// The method name with surrounding whitespace removed.
    #[must_use]
    pub fn method(&self) -> &str {
        self.header.method.trim()
    }

    /// The correlation identifier, when the caller supplied one.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header.request_id.as_deref()
    }
}
