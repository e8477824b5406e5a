//! Daemon lifecycle events and the observer that surfaces them.

use std::sync::Arc;

use courier_config::{Config, SocketEndpoint};
use tracing::{error, info};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// A milestone in the daemon's life, in the order they normally occur.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    /// Configuration loading is about to begin.
    BootstrapStarting,
    /// Configuration, telemetry, socket directory, and audit sink are ready.
    BootstrapSucceeded(&'a Config),
    /// A bootstrap stage failed; the daemon will not start.
    BootstrapFailed(&'a BootstrapError),
    /// The listener is accepting connections.
    ListenerReady(&'a SocketEndpoint),
    /// A termination signal arrived.
    ShutdownRequested,
    /// The listener and dispatcher have stopped.
    ShutdownComplete,
}

impl LifecycleEvent<'_> {
    /// Stable event name used as a structured log field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded(_) => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::ListenerReady(_) => "listener_ready",
            Self::ShutdownRequested => "shutdown_requested",
            Self::ShutdownComplete => "shutdown_complete",
        }
    }
}

/// Receives lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Called once per event, on the thread driving the lifecycle.
    fn report(&self, event: LifecycleEvent<'_>);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn report(&self, event: LifecycleEvent<'_>) {
        (**self).report(event);
    }
}

/// Reporter that logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn report(&self, event: LifecycleEvent<'_>) {
        let name = event.name();
        match event {
            LifecycleEvent::BootstrapSucceeded(config) => info!(
                target: HEALTH_TARGET,
                event = name,
                listen = %config.listen(),
                idle_timeout_secs = config.idle_timeout().as_secs(),
                idle_policy = %config.idle_policy(),
                audit_log = config.audit_log().map_or("-", |path| path.as_str()),
                log_format = %config.log_format(),
                "bootstrap complete"
            ),
            LifecycleEvent::BootstrapFailed(failure) => {
                error!(target: HEALTH_TARGET, event = name, error = %failure, "bootstrap failed");
            }
            LifecycleEvent::ListenerReady(endpoint) => {
                info!(target: HEALTH_TARGET, event = name, %endpoint, "ready");
            }
            LifecycleEvent::BootstrapStarting
            | LifecycleEvent::ShutdownRequested
            | LifecycleEvent::ShutdownComplete => info!(target: HEALTH_TARGET, event = name),
        }
    }
}
