//! Error types for the stub and the CLI runtime.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use courier_proto::FrameError;
use thiserror::Error;

/// Failures raised while performing a call through [`crate::Stub`].
#[derive(Debug, Error)]
pub enum StubError {
    /// The TCP host name did not resolve to an address.
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The daemon could not be reached.
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect {
        /// Endpoint as configured.
        endpoint: String,
        /// Connection error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {endpoint}")]
    UnsupportedUnix {
        /// Endpoint as configured.
        endpoint: String,
    },
    /// The request could not be serialised.
    #[error("failed to encode request: {0}")]
    Encode(#[source] FrameError),
    /// Reading from or writing to the socket failed.
    #[error("daemon transport failed: {0}")]
    Io(#[source] io::Error),
    /// No correlated response arrived before the deadline.
    #[error("no response for request {request_id} within {}ms", timeout.as_millis())]
    Timeout {
        /// Identifier of the unanswered request.
        request_id: String,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// The daemon sent a frame that is not a response.
    #[error("daemon sent a malformed response: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The daemon closed the connection before answering.
    #[error("daemon closed the connection before responding to {request_id}")]
    Closed {
        /// Identifier of the unanswered request.
        request_id: String,
    },
}

/// Failures surfaced by the `courier` binary.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("request body must be a JSON object: {0}")]
    InvalidBody(serde_json::Error),
    #[error("request body must be a JSON object, got {kind}")]
    BodyNotObject { kind: &'static str },
    #[error(transparent)]
    Call(#[from] StubError),
    #[error("failed to serialise response: {0}")]
    SerialiseResponse(serde_json::Error),
    #[error("failed to write response: {0}")]
    WriteResponse(io::Error),
}
