//! Socket listener with a polling accept thread.
//!
//! The bound socket is switched to non-blocking mode so the accept thread can
//! observe the shutdown flag between polls. Each accepted stream is returned
//! to blocking mode and handed to the [`ConnectionHandler`] on a thread of
//! its own.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use courier_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use std::os::unix::net::UnixListener;

#[cfg(unix)]
use super::unix::{self, SocketFile};

/// Sleep between polls when no connection is pending.
const IDLE_POLL: Duration = Duration::from_millis(25);
/// Sleep after an accept error, so a persistent failure does not spin.
const ERROR_POLL: Duration = Duration::from_millis(150);

enum Acceptor {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener, SocketFile),
}

impl Acceptor {
    fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let addr = resolve(host, *port).map_err(|source| ListenerError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
                TcpListener::bind(addr)
                    .map(Self::Tcp)
                    .map_err(|source| ListenerError::Bind {
                        endpoint: endpoint.to_string(),
                        source,
                    })
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => {
                let (listener, file) = unix::bind(path)?;
                Ok(Self::Unix(listener, file))
            }
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => Err(ListenerError::UnsupportedUnix {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Self::Unix(..) => None,
        }
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener, _) => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending connection, or returns `None` when none is waiting.
    fn poll(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                stream.set_nodelay(true)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener, _) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved"))
}

/// A bound endpoint that has not started accepting yet.
pub struct SocketListener {
    endpoint: SocketEndpoint,
    acceptor: Acceptor,
}

impl std::fmt::Debug for SocketListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketListener")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SocketListener {
    /// Binds `endpoint`. A Unix socket file left by a dead process is
    /// replaced; one still served by a live process is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the endpoint cannot be resolved or
    /// bound.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        Ok(Self {
            endpoint: endpoint.clone(),
            acceptor: Acceptor::bind(endpoint)?,
        })
    }

    /// Bound TCP address; useful when the configured port was `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Starts accepting on a background thread.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the socket cannot be made
    /// non-blocking or the accept thread cannot be spawned. A Unix socket
    /// file is removed in either case.
    pub fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.acceptor
            .set_nonblocking()
            .map_err(|source| ListenerError::Configure {
                endpoint: self.endpoint.to_string(),
                source,
            })?;
        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            stop: Arc::clone(&stop),
            handler,
        };
        let thread = thread::Builder::new()
            .name(String::from("courierd-accept"))
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Handle to the background accept thread.
#[derive(Debug)]
pub struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop. Established connections are unaffected.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        self.thread
            .take()
            .map_or(Ok(()), |thread| {
                thread.join().map_err(|_| ListenerError::ThreadPanic)
            })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

struct AcceptLoop {
    listener: SocketListener,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
}

impl AcceptLoop {
    fn run(self) {
        let endpoint = &self.listener.endpoint;
        info!(target: LISTENER_TARGET, %endpoint, "accepting connections");
        let mut accepted: u64 = 0;
        let mut reported = None::<io::ErrorKind>;

        while !self.stop.load(Ordering::SeqCst) {
            match self.listener.acceptor.poll() {
                Ok(Some(stream)) => {
                    reported = None;
                    self.dispatch(accepted, stream);
                    accepted += 1;
                }
                Ok(None) => thread::sleep(IDLE_POLL),
                Err(error) => {
                    // Repeats of the same failure are logged once.
                    if reported.replace(error.kind()) != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %endpoint, %error, "accept failed");
                    }
                    thread::sleep(ERROR_POLL);
                }
            }
        }
        info!(target: LISTENER_TARGET, %endpoint, accepted, "stopped accepting connections");
    }

    fn dispatch(&self, sequence: u64, stream: ConnectionStream) {
        let peer = stream.peer();
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(format!("courierd-conn-{sequence}"))
            .spawn(move || handler.handle(stream));
        match spawned {
            Ok(_) => debug!(target: LISTENER_TARGET, %peer, sequence, "connection accepted"),
            Err(error) => {
                warn!(target: LISTENER_TARGET, %peer, %error, "dropping connection; thread spawn failed");
            }
        }
    }
}
