//! Per-connection read loop: framing, authentication, and admission.

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use courier_config::IdlePolicy;
use courier_proto::{FrameDecoder, Request, Response};

use super::DISPATCH_TARGET;
use super::connection::{Connection, ConnectionRef, ResponseSink};
use super::dispatcher::JobSender;
use super::job::Job;
use crate::auth::Authenticator;
use crate::transport::{ConnectionHandler, ConnectionStream, IdleDeadline};

/// Bytes read from the socket per call.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Message for frames that are not a valid request envelope.
pub(crate) const FRAMING_ERROR_MESSAGE: &str = "Invalid request format";
/// Message for requests whose token is missing or wrong.
pub(crate) const AUTH_ERROR_MESSAGE: &str = "Authentication failed";
/// Message for requests arriving after the dispatcher stopped.
pub(crate) const UNAVAILABLE_MESSAGE: &str = "Service unavailable";

/// Timing limits applied to each connection.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Silence allowed before the connection is closed.
    pub idle_timeout: Duration,
    /// Whether inbound traffic restarts the idle timer.
    pub idle_policy: IdlePolicy,
    /// Bound on writing one response; a peer that does not drain its socket
    /// within it is disconnected.
    pub write_timeout: Option<Duration>,
}

/// [`ConnectionHandler`] that turns inbound frames into queued jobs.
#[derive(Debug)]
pub struct RpcConnectionHandler {
    authenticator: Authenticator,
    jobs: JobSender,
    limits: SessionLimits,
    next_id: AtomicU64,
}

impl RpcConnectionHandler {
    /// Builds a handler admitting jobs through `jobs`.
    #[must_use]
    pub fn new(authenticator: Authenticator, jobs: JobSender, limits: SessionLimits) -> Self {
        Self {
            authenticator,
            jobs,
            limits,
            next_id: AtomicU64::new(1),
        }
    }
}

impl ConnectionHandler for RpcConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let peer = stream.peer();
        let connection = match Connection::new(id, &stream, self.limits.write_timeout) {
            Ok(connection) => Arc::new(connection),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, connection = id, %peer, %error, "failed to clone connection stream");
                return;
            }
        };
        debug!(target: DISPATCH_TARGET, connection = id, %peer, "connection opened");

        let session = Session {
            handler: self,
            connection: Arc::clone(&connection),
        };
        let reason = session.run(&mut stream);
        connection.close();
        debug!(target: DISPATCH_TARGET, connection = id, %peer, ?reason, "connection closed");
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PeerClosed,
    IdleTimeout,
    AuthRejected,
    Unavailable,
    TransportError,
}

enum Admission {
    Continue,
    Close(CloseReason),
}

struct Session<'h> {
    handler: &'h RpcConnectionHandler,
    connection: Arc<Connection>,
}

impl Session<'_> {
    fn run(&self, stream: &mut ConnectionStream) -> CloseReason {
        let limits = self.handler.limits;
        let mut deadline =
            IdleDeadline::start(limits.idle_timeout, limits.idle_policy, Instant::now());
        let mut decoder = FrameDecoder::new();
        let mut chunk = vec![0_u8; READ_CHUNK_BYTES];

        loop {
            let Some(remaining) = deadline.remaining(Instant::now()) else {
                return CloseReason::IdleTimeout;
            };
            if let Err(error) = stream.set_read_timeout(Some(remaining)) {
                warn!(target: DISPATCH_TARGET, connection = self.connection.id(), %error, "failed to arm idle timer");
                return CloseReason::TransportError;
            }

            let read = match stream.read(&mut chunk) {
                Ok(0) => return CloseReason::PeerClosed,
                Ok(read) => read,
                Err(error)
                    if matches!(
                        error.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(error) => {
                    if self.connection.is_open() {
                        warn!(target: DISPATCH_TARGET, connection = self.connection.id(), %error, "read failed");
                    }
                    return CloseReason::TransportError;
                }
            };
            deadline.record_activity(Instant::now());

            let bytes = chunk.get(..read).unwrap_or_default();
            for frame in decoder.feed(bytes) {
                if let Admission::Close(reason) = self.admit(&frame) {
                    return reason;
                }
            }
        }
    }

    fn admit(&self, frame: &[u8]) -> Admission {
        let request = match Request::parse(frame) {
            Ok(request) => request,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, connection = self.connection.id(), %error, "malformed frame");
                self.connection
                    .respond(&Response::error(None, FRAMING_ERROR_MESSAGE));
                return Admission::Continue;
            }
        };

        let request_id = request.request_id().map(str::to_owned);
        if let Err(error) = self.handler.authenticator.check(&request.header) {
            warn!(
                target: DISPATCH_TARGET,
                connection = self.connection.id(),
                method = request.method(),
                request_id = request_id.as_deref().unwrap_or("-"),
                %error,
                "authentication failed; closing connection"
            );
            self.connection
                .respond(&Response::error(request_id, AUTH_ERROR_MESSAGE));
            return Admission::Close(CloseReason::AuthRejected);
        }

        let job = Job::new(request, ConnectionRef::new(&self.connection));
        if let Err(error) = self.handler.jobs.submit(job) {
            warn!(target: DISPATCH_TARGET, connection = self.connection.id(), %error, "rejecting request");
            self.connection
                .respond(&Response::error(request_id, UNAVAILABLE_MESSAGE));
            return Admission::Close(CloseReason::Unavailable);
        }
        Admission::Continue
    }
}
