//! Errors raised while resolving or executing a method.

use thiserror::Error;

/// Failures surfaced to the caller as an `ERROR` response.
///
/// The display text becomes the response's error message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// No handler is registered under the requested name.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// Requested method name.
        method: String,
    },
    /// The body lacked a required field or carried the wrong type.
    #[error("Invalid arguments: {message}")]
    InvalidArguments {
        /// Description of the offending field.
        message: String,
    },
    /// The handler failed for a domain reason.
    #[error("{message}")]
    Failed {
        /// Handler-supplied message.
        message: String,
    },
}

impl MethodError {
    /// Creates an unknown-method error.
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid-arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
