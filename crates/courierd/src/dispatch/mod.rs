//! Admission, queueing, and single-lane execution of requests.
//!
//! [`RpcConnectionHandler`] reads each connection, splits the byte stream
//! into frames, authenticates every request, and submits admitted jobs to
//! the [`Dispatcher`]. The dispatcher runs jobs one at a time in global
//! admission order and writes each response through the job's
//! [`ConnectionRef`], skipping the write when the connection has gone away.

mod connection;
mod dispatcher;
mod job;
mod observer;
mod queue;
mod session;

pub use self::connection::{Connection, ConnectionRef, Delivery, ResponseSink};
pub use self::dispatcher::{
    Dispatcher, DispatcherClosed, DispatcherHandle, DispatcherShared, DispatcherState,
    DispatcherStats, JobSender,
};
pub use self::job::Job;
pub use self::observer::{ExecutionObserver, JobOutcome, JobSummary, TracingExecutionObserver};
pub use self::queue::{JobQueue, QueuedJob};
pub use self::session::{RpcConnectionHandler, SessionLimits};

#[cfg(test)]
pub(crate) use self::dispatcher::INTERNAL_ERROR_MESSAGE;
#[cfg(test)]
pub(crate) use self::session::{AUTH_ERROR_MESSAGE, FRAMING_ERROR_MESSAGE, UNAVAILABLE_MESSAGE};

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
