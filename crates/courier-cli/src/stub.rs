//! Caller-side proxy that performs one correlated call at a time.

use std::io::{self, Read, Write};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use courier_config::SocketEndpoint;
use courier_proto::{Body, FrameDecoder, Request, Response, encode, unix_millis};

use crate::StubError;
use crate::transport::{Connection, connect};

const READ_CHUNK: usize = 8 * 1024;

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(0);

/// Builds a request identifier unique within this process and unlikely to
/// collide with other processes sharing the daemon.
#[must_use]
pub fn next_request_id() -> String {
    let sequence = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{sequence}", process::id(), unix_millis())
}

/// Connection to the daemon that sends requests and waits for the response
/// carrying the same `request_id`.
///
/// Responses for other identifiers are discarded. A timeout only bounds the
/// wait on this side; the daemon still executes the call.
#[derive(Debug)]
pub struct Stub {
    connection: Connection,
    decoder: FrameDecoder,
    auth_token: String,
    timeout: Duration,
}

impl Stub {
    /// Connects to `endpoint`, presenting `auth_token` on every call.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::Resolve`] or [`StubError::Connect`] when the
    /// daemon cannot be reached.
    pub fn connect(
        endpoint: &SocketEndpoint,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StubError> {
        let connection = connect(endpoint)?;
        connection
            .limit_writes(Some(timeout).filter(|bound| !bound.is_zero()))
            .map_err(StubError::Io)?;
        Ok(Self {
            connection,
            decoder: FrameDecoder::new(),
            auth_token: auth_token.into(),
            timeout,
        })
    }

    /// Invokes `method` with `body` and returns the correlated response.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::Timeout`] when no matching response arrives in
    /// time, [`StubError::Closed`] when the daemon hangs up first, and
    /// [`StubError::Malformed`] when a frame is not a response.
    pub fn call(&mut self, method: &str, body: Body) -> Result<Response, StubError> {
        let request_id = next_request_id();
        let request = Request::new(method, self.auth_token.as_str(), request_id.as_str(), body);
        let frame = encode(&request).map_err(StubError::Encode)?;
        self.connection.write_all(&frame).map_err(StubError::Io)?;
        self.connection.flush().map_err(StubError::Io)?;
        self.await_response(&request_id)
    }

    fn await_response(&mut self, request_id: &str) -> Result<Response, StubError> {
        let deadline = Instant::now() + self.timeout;
        let mut buffer = [0_u8; READ_CHUNK];
        // Frames left over from an earlier call are examined before reading.
        let mut read = 0;
        loop {
            let chunk = buffer.get(..read).unwrap_or_default();
            if let Some(response) = correlate(&mut self.decoder, chunk, request_id)? {
                return Ok(response);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(request_id));
            }
            self.connection
                .limit_reads(Some(remaining))
                .map_err(StubError::Io)?;
            read = match self.connection.read(&mut buffer) {
                Ok(0) => {
                    return Err(StubError::Closed {
                        request_id: request_id.to_owned(),
                    });
                }
                Ok(count) => count,
                Err(error) if is_timeout(&error) => return Err(self.timed_out(request_id)),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => 0,
                Err(error) => return Err(StubError::Io(error)),
            };
        }
    }

    fn timed_out(&self, request_id: &str) -> StubError {
        StubError::Timeout {
            request_id: request_id.to_owned(),
            timeout: self.timeout,
        }
    }
}

/// Feeds `chunk` to the decoder and returns the first response addressed to
/// `request_id`. Frames after it stay buffered.
fn correlate(
    decoder: &mut FrameDecoder,
    chunk: &[u8],
    request_id: &str,
) -> Result<Option<Response>, StubError> {
    for frame in decoder.feed(chunk) {
        let response: Response = serde_json::from_slice(&frame).map_err(StubError::Malformed)?;
        if response.request_id.as_deref() == Some(request_id) {
            return Ok(Some(response));
        }
    }
    Ok(None)
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
