//! Termination triggers for the foreground process.

use std::fmt;
use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

/// What ended the wait for shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A POSIX signal with this number was delivered.
    Signal(i32),
    /// Shutdown was requested programmatically.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(number) => write!(f, "signal {number}"),
            Self::Requested => f.write_str("request"),
        }
    }
}

/// Blocks the serving thread until the daemon should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown should begin.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the trigger cannot be armed.
    fn wait(&self) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors raised while arming a shutdown trigger.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Install(#[source] io::Error),
}

/// Waits for one of a fixed set of termination signals.
#[derive(Debug, Clone)]
pub struct SystemShutdownSignal {
    signals: Vec<i32>,
}

impl SystemShutdownSignal {
    /// Waits for any of `signals` instead of the default set.
    #[must_use]
    pub fn with_signals(signals: impl IntoIterator<Item = i32>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
        }
    }
}

impl Default for SystemShutdownSignal {
    /// SIGTERM, SIGINT, SIGQUIT, and SIGHUP.
    fn default() -> Self {
        Self::with_signals([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let mut signals = Signals::new(&self.signals).map_err(ShutdownError::Install)?;
        Ok(signals
            .forever()
            .next()
            .map_or(ShutdownCause::Requested, ShutdownCause::Signal))
    }
}
