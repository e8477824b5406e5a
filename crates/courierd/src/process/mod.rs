//! Foreground process lifecycle: bootstrap, serve, wait for a signal, stop.

mod errors;
mod shutdown;

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, LifecycleEvent};

pub use self::errors::LaunchError;
pub use self::shutdown::{ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Runs the daemon with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, listener startup, signal
/// installation, or shutdown fails.
pub fn run_server() -> Result<(), LaunchError> {
    run_server_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal::default(),
    )
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// See [`run_server`].
pub fn run_server_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    info!(target: PROCESS_TARGET, pid = std::process::id(), "starting courierd");
    let daemon = bootstrap_with(loader, Arc::clone(&reporter))?;
    let server = daemon.serve()?;

    let waited = shutdown.wait();
    if let Ok(cause) = &waited {
        info!(target: PROCESS_TARGET, %cause, "shutting down");
    }
    reporter.report(LifecycleEvent::ShutdownRequested);
    let stopped = server.shutdown();
    waited?;
    stopped?;
    reporter.report(LifecycleEvent::ShutdownComplete);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
