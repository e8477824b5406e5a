//! Connection acceptance for the daemon listener.
//!
//! The transport binds the configured endpoint, accepts connections on a
//! background thread, and hands each accepted stream to a
//! [`ConnectionHandler`] on its own thread. Framing, authentication, and
//! dispatch live above this layer.

mod errors;
mod idle;
mod listener;
mod stream;
#[cfg(unix)]
mod unix;

pub use self::errors::{ListenerError, SocketPathConflict};
pub(crate) use self::idle::IdleDeadline;
pub use self::listener::{ListenerHandle, SocketListener};
pub use self::stream::{ConnectionHandler, ConnectionStream};

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
