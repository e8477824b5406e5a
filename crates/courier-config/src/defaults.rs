//! Built-in values for every configuration field.

use crate::socket::SocketEndpoint;

/// TCP port of the default endpoint.
pub const DEFAULT_TCP_PORT: u16 = 7070;

/// Host of the default endpoint: all IPv4 interfaces.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Development shared secret. The daemon warns at startup while it is in use.
pub const DEFAULT_AUTH_TOKEN: &str = "courier-dev-token";

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_EXECUTION_DELAY_MS: u64 = 50;

/// Bound on writing one response frame before the connection is dropped.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// `tcp://0.0.0.0:7070`.
#[must_use]
pub fn default_listen_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_BIND_HOST, DEFAULT_TCP_PORT)
}

#[must_use]
pub fn default_auth_token() -> String {
    DEFAULT_AUTH_TOKEN.to_owned()
}

#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}
