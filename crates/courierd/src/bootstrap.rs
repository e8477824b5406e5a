//! Turns configuration into a daemon that is ready to serve.
//!
//! Bootstrap runs four stages in order: load configuration, install the
//! subscriber, create the socket directory, open the audit sink. The first
//! failing stage aborts the rest.

use std::fmt;
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;
use tracing::warn;

use courier_config::{Config, SocketPreparationError};

use crate::audit::{AuditSink, JsonlAuditSink, SinkError, TracingAuditSink};
use crate::health::{HealthReporter, LifecycleEvent};
use crate::server::{Server, ServerComponents, ServerError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Source of the daemon configuration.
///
/// Any `Fn() -> Result<Config, _>` closure is a loader, which keeps one-off
/// test loaders short.
pub trait ConfigLoader: Send + Sync {
    /// Produces the resolved configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

impl<F> ConfigLoader for F
where
    F: Fn() -> Result<Config, Arc<OrthoError>> + Send + Sync,
{
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        self()
    }
}

/// Reads defaults, the configuration file, `COURIER_*` variables and the
/// process arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// The bootstrap stage that failed, with its cause.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    #[error("failed to prepare listener socket: {source}")]
    Socket {
        #[source]
        source: SocketPreparationError,
    },
    #[error("failed to open audit log: {source}")]
    Audit {
        #[source]
        source: SinkError,
    },
}

/// Everything the stages produced.
struct Prepared {
    config: Config,
    telemetry: TelemetryHandle,
    audit: Arc<dyn AuditSink>,
}

impl Prepared {
    fn assemble(loader: &dyn ConfigLoader) -> Result<Self, BootstrapError> {
        let config = loader
            .load()
            .map_err(|source| BootstrapError::Configuration { source })?;
        let telemetry = telemetry::initialise(&config)
            .map_err(|source| BootstrapError::Telemetry { source })?;
        config
            .listen()
            .prepare_filesystem()
            .map_err(|source| BootstrapError::Socket { source })?;
        let audit: Arc<dyn AuditSink> = match config.audit_log() {
            Some(path) => Arc::new(
                JsonlAuditSink::open(path).map_err(|source| BootstrapError::Audit { source })?,
            ),
            None => Arc::new(TracingAuditSink),
        };
        Ok(Self {
            config,
            telemetry,
            audit,
        })
    }
}

/// A bootstrapped daemon that has not bound its listener yet.
pub struct Daemon {
    prepared: Prepared,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.prepared.config
    }

    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.prepared.telemetry
    }

    /// Audit sink shared by every side-effecting method.
    #[must_use]
    pub fn audit(&self) -> Arc<dyn AuditSink> {
        Arc::clone(&self.prepared.audit)
    }

    /// Starts serving the built-in method table.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener or dispatcher cannot start.
    pub fn serve(&self) -> Result<Server, ServerError> {
        self.serve_with(ServerComponents::standard(self.audit()))
    }

    /// Starts serving `components` and reports the bound endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener or dispatcher cannot start.
    pub fn serve_with(&self, components: ServerComponents) -> Result<Server, ServerError> {
        let server = Server::start(self.config(), components)?;
        self.reporter
            .report(LifecycleEvent::ListenerReady(server.endpoint()));
        Ok(server)
    }
}

impl fmt::Debug for Daemon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Daemon")
            .field("listen", self.config().listen())
            .field("telemetry", &self.prepared.telemetry)
            .finish_non_exhaustive()
    }
}

/// Runs every bootstrap stage, reporting the outcome to `reporter`.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first failing stage, after the
/// reporter has seen it.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.report(LifecycleEvent::BootstrapStarting);
    let prepared = Prepared::assemble(loader).inspect_err(|error| {
        reporter.report(LifecycleEvent::BootstrapFailed(error));
    })?;
    if prepared.config.uses_default_auth_token() {
        warn!(
            target: BOOTSTRAP_TARGET,
            "using the built-in development auth token; set COURIER_AUTH_TOKEN"
        );
    }
    reporter.report(LifecycleEvent::BootstrapSucceeded(&prepared.config));
    Ok(Daemon { prepared, reporter })
}
