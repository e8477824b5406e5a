//! Unbounded FIFO of admitted jobs.

use std::collections::VecDeque;

use super::job::Job;

/// A job tagged with its admission sequence number.
#[derive(Debug)]
pub struct QueuedJob {
    /// Position in global admission order, starting at 1.
    pub sequence: u64,
    /// The admitted job.
    pub job: Job,
}

/// Ordered holding area owned by the dispatcher.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<QueuedJob>,
    admitted: u64,
}

impl JobQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `job` to the tail and returns its sequence number.
    pub fn enqueue(&mut self, job: Job) -> u64 {
        self.admitted += 1;
        let sequence = self.admitted;
        self.jobs.push_back(QueuedJob { sequence, job });
        sequence
    }

    /// Removes and returns the head.
    pub fn dequeue(&mut self) -> Option<QueuedJob> {
        self.jobs.pop_front()
    }

    /// Number of jobs waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` when no jobs are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drops every waiting job, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.jobs.len();
        self.jobs.clear();
        discarded
    }
}
