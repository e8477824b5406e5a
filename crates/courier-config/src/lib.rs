//! Shared configuration for the courier daemon and its stub client.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then a
//! configuration file (`--config-path` or `COURIER_CONFIG_PATH`), then
//! `COURIER_*` environment variables, then command-line flags. Both binaries
//! load the same [`Config`] so the caller and the daemon agree on the
//! endpoint and the shared secret.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod modes;
mod socket;

pub use defaults::{
    DEFAULT_AUTH_TOKEN, DEFAULT_BIND_HOST, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_EXECUTION_DELAY_MS,
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, DEFAULT_WRITE_TIMEOUT_MS, default_auth_token,
    default_listen_endpoint, default_log_filter,
};
pub use modes::{IdlePolicy, LogFormat, ModeParseError};
pub use socket::{EndpointDefect, SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `courierd` and `courier`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "COURIER")]
pub struct Config {
    /// Endpoint the daemon listens on and the stub connects to.
    #[ortho_config(default = default_listen_endpoint())]
    pub listen: SocketEndpoint,
    /// Shared secret every request must present.
    #[ortho_config(default = default_auth_token())]
    pub auth_token: String,
    /// Seconds of idleness before the daemon closes a connection.
    #[ortho_config(default = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,
    /// Whether inbound traffic restarts the idle timer.
    #[ortho_config(default = IdlePolicy::ResetOnActivity)]
    pub idle_policy: IdlePolicy,
    /// Fixed latency in milliseconds applied before each method executes.
    #[ortho_config(default = DEFAULT_EXECUTION_DELAY_MS)]
    pub execution_delay_ms: u64,
    /// Milliseconds the daemon may block writing one response; `0` removes
    /// the bound.
    #[ortho_config(default = DEFAULT_WRITE_TIMEOUT_MS)]
    pub write_timeout_ms: u64,
    /// Seconds the stub waits for a correlated response.
    #[ortho_config(default = DEFAULT_CALL_TIMEOUT_SECS)]
    pub call_timeout_secs: u64,
    /// Optional JSONL file receiving audit records.
    pub audit_log: Option<Utf8PathBuf>,
    /// Tracing filter expression.
    #[ortho_config(default = default_log_filter())]
    pub log_filter: String,
    /// Log rendering format.
    #[ortho_config(default = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_endpoint(),
            auth_token: default_auth_token(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            idle_policy: IdlePolicy::default(),
            execution_delay_ms: DEFAULT_EXECUTION_DELAY_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            audit_log: None,
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Loads defaults, the configuration file, `COURIER_*` variables and the
    /// process arguments.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer is malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Like [`Config::load`], taking the arguments from `args`, program name
    /// first.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer is malformed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Listener endpoint.
    #[must_use]
    pub fn listen(&self) -> &SocketEndpoint {
        &self.listen
    }

    /// Shared secret compared against each request's `auth_token`.
    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Returns `true` when the development token has not been overridden.
    #[must_use]
    pub fn uses_default_auth_token(&self) -> bool {
        self.auth_token == DEFAULT_AUTH_TOKEN
    }

    /// Per-connection idle timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Idle timer semantics.
    #[must_use]
    pub fn idle_policy(&self) -> IdlePolicy {
        self.idle_policy
    }

    /// Latency applied before each method executes.
    #[must_use]
    pub fn execution_delay(&self) -> Duration {
        Duration::from_millis(self.execution_delay_ms)
    }

    /// Bound on a single response write, `None` when disabled.
    #[must_use]
    pub fn write_timeout(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.write_timeout_ms)).filter(|bound| !bound.is_zero())
    }

    /// Caller-side response timeout.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// JSONL audit file, when configured.
    #[must_use]
    pub fn audit_log(&self) -> Option<&Utf8Path> {
        self.audit_log.as_deref()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log rendering format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
