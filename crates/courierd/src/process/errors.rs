use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::server::ServerError;

use super::shutdown::ShutdownError;

/// Why [`super::run_server`] returned early or failed to stop cleanly.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap stopped at one of its stages.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The server failed to start or to stop.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// The shutdown trigger could not be armed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}
