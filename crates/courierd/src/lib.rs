//! The courier daemon: an RPC skeleton over a newline-framed byte stream.
//!
//! A listener accepts TCP or Unix socket connections and hands each to a
//! session thread. Sessions split the byte stream into frames, authenticate
//! every request against a shared secret, and submit admitted requests as
//! jobs to a single dispatcher thread. The dispatcher executes one job at a
//! time in global admission order, across all connections, and writes each
//! correlated response back to the originating connection if it is still
//! open.
//!
//! ## Failure handling
//!
//! Malformed frames receive an error response and the connection stays
//! open. Authentication failures receive one error response and the
//! connection is closed. Unknown methods and handler failures become error
//! responses carrying the failure text. Audit writes made by handlers are
//! best-effort: a failing audit store is logged and never changes the
//! response. No single connection can bring down the listener.

mod audit;
mod auth;
mod bootstrap;
pub mod dispatch;
mod health;
pub mod methods;
mod process;
mod server;
pub mod telemetry;
mod transport;

pub use audit::{AuditKind, AuditRecord, AuditSink, JsonlAuditSink, SinkError, TracingAuditSink};
pub use auth::{AuthError, Authenticator};
pub use bootstrap::{BootstrapError, ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
pub use health::{HealthReporter, LifecycleEvent, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server,
    run_server_with,
};
pub use server::{Server, ServerComponents, ServerError};
pub use transport::{
    ConnectionHandler, ConnectionStream, ListenerError, ListenerHandle, SocketListener,
    SocketPathConflict,
};

#[cfg(test)]
mod tests;
