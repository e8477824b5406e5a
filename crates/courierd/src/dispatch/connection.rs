//! Write side of a connection and the non-owning reference jobs carry.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use courier_proto::{Response, encode};

use super::DISPATCH_TARGET;
use crate::transport::ConnectionStream;

/// Result of attempting to deliver a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The response frame was written and flushed.
    Written,
    /// The connection had already closed; nothing was written.
    ConnectionClosed,
    /// The write failed and the connection has been closed.
    Failed,
}

/// Destination for encoded response frames.
pub trait ResponseSink: Send + Sync {
    /// Identifier used in logs and observer summaries.
    fn id(&self) -> u64;

    /// Returns `false` once the connection has closed.
    fn is_open(&self) -> bool;

    /// Writes one complete frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the write fails.
    fn send_frame(&self, frame: &[u8]) -> io::Result<()>;

    /// Marks the connection closed.
    fn close(&self);
}

/// Encodes `response` and writes it to `sink`.
pub(crate) fn deliver(sink: &dyn ResponseSink, response: &Response) -> Delivery {
    if !sink.is_open() {
        return Delivery::ConnectionClosed;
    }
    let frame = match encode(response) {
        Ok(frame) => frame,
        Err(error) => {
            debug!(target: DISPATCH_TARGET, connection = sink.id(), %error, "failed to encode response");
            return Delivery::Failed;
        }
    };
    match sink.send_frame(&frame) {
        Ok(()) => Delivery::Written,
        Err(error) if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            warn!(target: DISPATCH_TARGET, connection = sink.id(), %error, "peer stopped reading; dropping connection");
            sink.close();
            Delivery::Failed
        }
        Err(error) => {
            debug!(target: DISPATCH_TARGET, connection = sink.id(), %error, "response write failed");
            sink.close();
            Delivery::Failed
        }
    }
}

/// The write half of an accepted socket.
///
/// The owning session holds the only strong reference; jobs refer to it
/// through a [`ConnectionRef`]. Writes are serialised by an internal mutex so
/// frames from the session and the dispatcher never interleave.
///
/// A peer that stops reading cannot hold the dispatcher: each write is
/// bounded, and closing goes through a separate handle so it never waits on
/// a blocked writer.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    writer: Mutex<ConnectionStream>,
    control: ConnectionStream,
    open: AtomicBool,
}

impl Connection {
    /// Wraps cloned handles of `stream` as the write half. `write_timeout`
    /// bounds each blocking write; `None` leaves writes unbounded.
    ///
    /// # Errors
    ///
    /// Returns the IO error raised while cloning the socket handle or arming
    /// the write timeout.
    pub fn new(
        id: u64,
        stream: &ConnectionStream,
        write_timeout: Option<Duration>,
    ) -> io::Result<Self> {
        let writer = stream.try_clone()?;
        writer.set_write_timeout(write_timeout)?;
        Ok(Self {
            id,
            writer: Mutex::new(writer),
            control: stream.try_clone()?,
            open: AtomicBool::new(true),
        })
    }

    /// Delivers `response` unless the connection has closed.
    pub fn respond(&self, response: &Response) -> Delivery {
        deliver(self, response)
    }
}

impl ResponseSink for Connection {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(frame)?;
        writer.flush()
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            // Also wakes a writer blocked on the other handle.
            if let Err(error) = self.control.shutdown() {
                debug!(target: DISPATCH_TARGET, connection = self.id, %error, "socket shutdown failed");
            }
        }
    }
}

/// Non-owning handle through which a job writes its response.
#[derive(Clone)]
pub struct ConnectionRef {
    id: u64,
    sink: Weak<dyn ResponseSink>,
}

impl ConnectionRef {
    /// Downgrades `sink` to a reference that does not keep it alive.
    pub fn new<S>(sink: &Arc<S>) -> Self
    where
        S: ResponseSink + 'static,
    {
        let weak: Weak<S> = Arc::downgrade(sink);
        Self {
            id: sink.id(),
            sink: weak,
        }
    }

    /// Identifier of the referenced connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` while the connection is alive and open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sink.upgrade().is_some_and(|sink| sink.is_open())
    }

    /// Delivers `response`, skipping the write if the connection is gone.
    pub fn deliver(&self, response: &Response) -> Delivery {
        match self.sink.upgrade() {
            Some(sink) => deliver(sink.as_ref(), response),
            None => Delivery::ConnectionClosed,
        }
    }
}

impl std::fmt::Debug for ConnectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRef")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
