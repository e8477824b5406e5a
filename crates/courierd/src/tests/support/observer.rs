//! Execution observer that records start and end instants.

use std::sync::Mutex;
use std::time::Instant;

use crate::dispatch::{Delivery, ExecutionObserver, JobOutcome, JobSummary};

/// One finished job with its execution interval.
#[derive(Debug, Clone)]
pub struct ObservedJob {
    pub summary: JobSummary,
    pub started: Instant,
    pub finished: Instant,
    pub outcome: JobOutcome,
    pub delivery: Delivery,
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    started: Mutex<Vec<(JobSummary, Instant)>>,
    finished: Mutex<Vec<ObservedJob>>,
}

impl RecordingObserver {
    /// Request ids in the order their jobs started.
    pub fn start_order(&self) -> Vec<Option<String>> {
        self.started
            .lock()
            .expect("observer mutex poisoned")
            .iter()
            .map(|(summary, _)| summary.request_id.clone())
            .collect()
    }

    pub fn finished(&self) -> Vec<ObservedJob> {
        self.finished.lock().expect("observer mutex poisoned").clone()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.lock().expect("observer mutex poisoned").len()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn job_started(&self, job: &JobSummary) {
        self.started
            .lock()
            .expect("observer mutex poisoned")
            .push((job.clone(), Instant::now()));
    }

    fn job_finished(&self, job: &JobSummary, outcome: &JobOutcome, delivery: Delivery) {
        let finished = Instant::now();
        let started = self
            .started
            .lock()
            .expect("observer mutex poisoned")
            .iter()
            .rev()
            .find(|(summary, _)| summary.sequence == job.sequence)
            .map_or(finished, |(_, at)| *at);
        self.finished
            .lock()
            .expect("observer mutex poisoned")
            .push(ObservedJob {
                summary: job.clone(),
                started,
                finished,
                outcome: outcome.clone(),
                delivery,
            });
    }
}
