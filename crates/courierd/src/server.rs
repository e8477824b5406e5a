//! Assembles the listener, session handler, and dispatcher into a server.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use courier_config::{Config, SocketEndpoint};

use crate::audit::AuditSink;
use crate::auth::Authenticator;
use crate::dispatch::{
    Dispatcher, DispatcherHandle, DispatcherStats, ExecutionObserver, RpcConnectionHandler,
    SessionLimits, TracingExecutionObserver,
};
use crate::methods::MethodRegistry;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Errors raised while starting or stopping a [`Server`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener failed to bind, start, or join.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The dispatcher thread could not be spawned.
    #[error("failed to spawn dispatcher thread: {source}")]
    SpawnDispatcher {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The dispatcher thread panicked.
    #[error("dispatcher thread panicked")]
    DispatcherPanic,
}

/// Pluggable parts of a server.
pub struct ServerComponents {
    /// Methods the dispatcher can invoke.
    pub registry: MethodRegistry,
    /// Hook notified around each job.
    pub observer: Arc<dyn ExecutionObserver>,
}

impl ServerComponents {
    /// Built-in methods writing audit records to `audit`, with a logging
    /// observer.
    #[must_use]
    pub fn standard(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            registry: MethodRegistry::standard(audit),
            observer: Arc::new(TracingExecutionObserver),
        }
    }
}

/// A running daemon: accept thread, per-connection sessions, and dispatcher.
pub struct Server {
    endpoint: SocketEndpoint,
    local_addr: Option<SocketAddr>,
    listener: ListenerHandle,
    dispatcher: DispatcherHandle,
}

impl Server {
    /// Binds `config.listen` and starts serving.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the endpoint cannot be bound or a thread
    /// cannot be spawned.
    pub fn start(config: &Config, components: ServerComponents) -> Result<Self, ServerError> {
        let listener = SocketListener::bind(config.listen())?;
        let local_addr = listener.local_addr();

        let dispatcher = Dispatcher::new(
            components.registry,
            components.observer,
            config.execution_delay(),
        )
        .spawn()
        .map_err(|source| ServerError::SpawnDispatcher { source })?;

        let handler = Arc::new(RpcConnectionHandler::new(
            Authenticator::new(config.auth_token()),
            dispatcher.sender(),
            SessionLimits {
                idle_timeout: config.idle_timeout(),
                idle_policy: config.idle_policy(),
                write_timeout: config.write_timeout(),
            },
        ));
        let listener = listener.start(handler)?;

        info!(
            target: SERVER_TARGET,
            endpoint = %config.listen(),
            idle_timeout_secs = config.idle_timeout().as_secs(),
            idle_policy = %config.idle_policy(),
            execution_delay_ms = u64::try_from(config.execution_delay().as_millis()).unwrap_or(u64::MAX),
            "server started"
        );

        Ok(Self {
            endpoint: config.listen().clone(),
            local_addr,
            listener,
            dispatcher,
        })
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// The bound TCP address, useful when the configured port was `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Current dispatcher counters.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        self.dispatcher.stats()
    }

    /// Stops accepting, lets the job in flight finish, and discards the rest.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when either background thread panicked.
    pub fn shutdown(self) -> Result<(), ServerError> {
        let Self {
            listener,
            dispatcher,
            ..
        } = self;
        listener.shutdown();
        listener.join()?;
        if !dispatcher.shutdown() {
            return Err(ServerError::DispatcherPanic);
        }
        info!(target: SERVER_TARGET, "server stopped");
        Ok(())
    }
}
