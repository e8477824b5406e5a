//! The single-lane worker that drains the job queue.
//!
//! One thread owns the [`JobQueue`]. Sessions hand it jobs through a
//! [`JobSender`] backed by an mpsc channel, so producers never touch the
//! queue directly. The run loop alternates between two states:
//!
//! * `Idle`: pull everything waiting on the channel into the queue; if the
//!   queue is still empty, block on the channel for the next job.
//! * `Busy`: execute the head job to completion (delay, handler, response
//!   write), then return to `Idle` and look again.
//!
//! Only this thread executes handlers, so at most one job is active at any
//! instant and jobs start in admission order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use courier_proto::Response;

use super::DISPATCH_TARGET;
use super::job::Job;
use super::observer::{ExecutionObserver, JobOutcome, JobSummary};
use super::queue::{JobQueue, QueuedJob};
use crate::methods::MethodRegistry;

/// Message text for handlers that panic.
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

enum Message {
    Job(Job),
    Stop,
}

/// Whether the dispatcher is executing a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for work.
    Idle,
    /// Executing a job.
    Busy,
}

/// Point-in-time view of dispatcher counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Jobs admitted and not yet started.
    pub queued: usize,
    /// Current state.
    pub state: DispatcherState,
    /// Jobs admitted since startup.
    pub admitted: u64,
    /// Jobs whose execution has finished.
    pub completed: u64,
}

/// Counters shared between producers, the worker, and observers.
#[derive(Debug, Default)]
pub struct DispatcherShared {
    queued: AtomicUsize,
    busy: AtomicBool,
    admitted: AtomicU64,
    completed: AtomicU64,
}

impl DispatcherShared {
    /// Reads the current counters.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            queued: self.queued.load(Ordering::SeqCst),
            state: if self.busy.load(Ordering::SeqCst) {
                DispatcherState::Busy
            } else {
                DispatcherState::Idle
            },
            admitted: self.admitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
        }
    }
}

/// Returned when a job is submitted after the dispatcher has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dispatcher is not accepting jobs")]
pub struct DispatcherClosed;

/// Producer handle used by sessions to admit jobs.
#[derive(Debug, Clone)]
pub struct JobSender {
    sender: Sender<Message>,
    shared: Arc<DispatcherShared>,
}

impl JobSender {
    /// Appends `job` to the global queue.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherClosed`] once the worker has exited.
    pub fn submit(&self, job: Job) -> Result<(), DispatcherClosed> {
        self.shared.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Message::Job(job)).is_err() {
            self.shared.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatcherClosed);
        }
        self.shared.admitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Shared counters.
    #[must_use]
    pub fn shared(&self) -> &Arc<DispatcherShared> {
        &self.shared
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Job(job) => f.debug_tuple("Job").field(&job.method()).finish(),
            Self::Stop => f.write_str("Stop"),
        }
    }
}

/// Worker configuration and collaborators.
pub struct Dispatcher {
    registry: MethodRegistry,
    observer: Arc<dyn ExecutionObserver>,
    execution_delay: Duration,
}

impl Dispatcher {
    /// Builds a dispatcher around `registry`.
    #[must_use]
    pub fn new(
        registry: MethodRegistry,
        observer: Arc<dyn ExecutionObserver>,
        execution_delay: Duration,
    ) -> Self {
        Self {
            registry,
            observer,
            execution_delay,
        }
    }

    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the IO error raised when the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<DispatcherHandle> {
        let (sender, receiver) = mpsc::channel();
        let shared = Arc::new(DispatcherShared::default());
        let worker = Worker {
            dispatcher: self,
            receiver,
            queue: JobQueue::new(),
            shared: Arc::clone(&shared),
        };
        let thread = thread::Builder::new()
            .name(String::from("courierd-dispatch"))
            .spawn(move || worker.run())?;
        Ok(DispatcherHandle {
            sender: JobSender { sender, shared },
            thread: Some(thread),
        })
    }
}

/// Handle to the running worker.
#[derive(Debug)]
pub struct DispatcherHandle {
    sender: JobSender,
    thread: Option<thread::JoinHandle<()>>,
}

impl DispatcherHandle {
    /// A producer handle for sessions.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        self.sender.clone()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        self.sender.shared.stats()
    }

    /// Stops the worker after the job in flight, discarding queued jobs.
    ///
    /// Returns `false` if the worker thread panicked.
    pub fn shutdown(mut self) -> bool {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> bool {
        let _ = self.sender.sender.send(Message::Stop);
        match self.thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

struct Worker {
    dispatcher: Dispatcher,
    receiver: Receiver<Message>,
    queue: JobQueue,
    shared: Arc<DispatcherShared>,
}

impl Worker {
    fn run(mut self) {
        info!(target: DISPATCH_TARGET, "dispatcher started");
        loop {
            if !self.drain_channel() {
                break;
            }
            let Some(next) = self.queue.dequeue() else {
                match self.receiver.recv() {
                    Ok(Message::Job(job)) => {
                        self.queue.enqueue(job);
                        continue;
                    }
                    Ok(Message::Stop) | Err(_) => break,
                }
            };
            self.execute(next);
        }
        let discarded = self.queue.clear();
        self.shared.queued.fetch_sub(discarded, Ordering::SeqCst);
        if discarded > 0 {
            warn!(target: DISPATCH_TARGET, discarded, "dispatcher stopped with queued jobs");
        }
        info!(target: DISPATCH_TARGET, "dispatcher stopped");
    }

    /// Moves every pending message into the queue. Returns `false` on stop.
    fn drain_channel(&mut self) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(Message::Job(job)) => {
                    self.queue.enqueue(job);
                }
                Ok(Message::Stop) | Err(TryRecvError::Disconnected) => return false,
                Err(TryRecvError::Empty) => return true,
            }
        }
    }

    fn execute(&self, queued: QueuedJob) {
        let QueuedJob { sequence, job } = queued;
        self.shared.queued.fetch_sub(1, Ordering::SeqCst);
        self.shared.busy.store(true, Ordering::SeqCst);

        let summary = JobSummary {
            sequence,
            method: job.method().to_owned(),
            request_id: job.request_id().map(str::to_owned),
            connection_id: job.connection().id(),
            waited: job.received_at().elapsed(),
        };
        self.dispatcher.observer.job_started(&summary);

        if !self.dispatcher.execution_delay.is_zero() {
            thread::sleep(self.dispatcher.execution_delay);
        }

        let request_id = job.request_id().map(str::to_owned);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatcher
                .registry
                .dispatch(job.method(), job.request_id(), job.body())
        }));
        let (response, outcome) = match result {
            Ok(Ok(value)) => (Response::ok(request_id, value), JobOutcome::Succeeded),
            Ok(Err(error)) => {
                let message = error.to_string();
                debug!(target: DISPATCH_TARGET, sequence, %message, "job failed");
                (
                    Response::error(request_id, message.clone()),
                    JobOutcome::Failed(message),
                )
            }
            Err(_) => {
                warn!(target: DISPATCH_TARGET, sequence, method = job.method(), "handler panicked");
                (
                    Response::error(request_id, INTERNAL_ERROR_MESSAGE),
                    JobOutcome::Panicked,
                )
            }
        };

        let delivery = job.connection().deliver(&response);
        self.dispatcher
            .observer
            .job_finished(&summary, &outcome, delivery);

        self.shared.completed.fetch_add(1, Ordering::SeqCst);
        self.shared.busy.store(false, Ordering::SeqCst);
    }
}
