//! Execution monitoring hook.

use std::time::Duration;

use tracing::debug;

use super::DISPATCH_TARGET;
use super::connection::Delivery;

/// Identity of a job as seen by an [`ExecutionObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    /// Admission sequence number.
    pub sequence: u64,
    /// Method name.
    pub method: String,
    /// Correlation identifier, when supplied.
    pub request_id: Option<String>,
    /// Originating connection.
    pub connection_id: u64,
    /// Time spent queued before execution started.
    pub waited: Duration,
}

/// How a job's handler finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The handler returned a result.
    Succeeded,
    /// The handler or registry returned an error with this message.
    Failed(String),
    /// The handler panicked.
    Panicked,
}

/// Observer notified around every handler invocation.
///
/// `job_started` and `job_finished` are called from the dispatcher thread,
/// so for any two jobs one pair of calls completes before the next begins.
pub trait ExecutionObserver: Send + Sync {
    /// A job left the queue and is about to run.
    fn job_started(&self, job: &JobSummary);

    /// A job's handler returned and its response was delivered or skipped.
    fn job_finished(&self, job: &JobSummary, outcome: &JobOutcome, delivery: Delivery);
}

/// Observer that logs job transitions at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn job_started(&self, job: &JobSummary) {
        debug!(
            target: DISPATCH_TARGET,
            sequence = job.sequence,
            method = %job.method,
            request_id = job.request_id.as_deref().unwrap_or("-"),
            connection = job.connection_id,
            waited_ms = u64::try_from(job.waited.as_millis()).unwrap_or(u64::MAX),
            "job started"
        );
    }

    fn job_finished(&self, job: &JobSummary, outcome: &JobOutcome, delivery: Delivery) {
        debug!(
            target: DISPATCH_TARGET,
            sequence = job.sequence,
            method = %job.method,
            request_id = job.request_id.as_deref().unwrap_or("-"),
            ?outcome,
            ?delivery,
            "job finished"
        );
    }
}
