//! Failures raised while binding or running the listener.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host did not resolve to a usable address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be bound.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        /// Endpoint as configured.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking accepts.
    #[error("failed to configure {endpoint}: {source}")]
    Configure {
        /// Endpoint as configured.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A file already occupies the Unix socket path and cannot be replaced.
    #[error("cannot reuse unix socket path {path}: {reason}")]
    SocketPath {
        /// Socket path.
        path: Utf8PathBuf,
        /// What was found at the path.
        #[source]
        reason: SocketPathConflict,
    },
    /// Unix endpoints were configured on a platform without them.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Endpoint as configured.
        endpoint: String,
    },
    /// The accept thread could not be spawned.
    #[error("failed to spawn accept thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("accept thread panicked")]
    ThreadPanic,
}

/// Why an existing file at the socket path blocks binding.
#[derive(Debug, Error)]
pub enum SocketPathConflict {
    /// A live process still accepts connections on the socket.
    #[error("another listener is serving it")]
    InUse,
    /// The path is a regular file, directory, or other non-socket.
    #[error("it is not a socket")]
    NotASocket,
    /// Inspecting or probing the existing socket failed.
    #[error("probing it failed: {0}")]
    Probe(#[source] io::Error),
    /// Removing the stale socket failed.
    #[error("removing it failed: {0}")]
    Remove(#[source] io::Error),
}

impl ListenerError {
    pub(crate) fn socket_path(path: impl Into<Utf8PathBuf>, reason: SocketPathConflict) -> Self {
        Self::SocketPath {
            path: path.into(),
            reason,
        }
    }
}
