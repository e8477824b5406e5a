//! Audit sink doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use mockall::mock;

use crate::audit::{AuditRecord, AuditSink, SinkError};

mock! {
    pub Sink {}
    impl AuditSink for Sink {
        fn write(&self, record: &AuditRecord) -> Result<(), SinkError>;
    }
}

/// Keeps every record written.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn write(&self, record: &AuditRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .expect("audit mutex poisoned")
            .push(record.clone());
        Ok(())
    }
}

/// Fails every write, counting attempts.
#[derive(Debug, Default)]
pub struct FailingAuditSink {
    attempts: AtomicUsize,
}

impl FailingAuditSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl AuditSink for FailingAuditSink {
    fn write(&self, _record: &AuditRecord) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::unavailable("audit store offline"))
    }
}

/// Flags any two writes that are in progress at the same time.
#[derive(Debug, Default)]
pub struct OverlapDetectingSink {
    active: AtomicUsize,
    overlapped: AtomicBool,
    writes: AtomicUsize,
}

impl OverlapDetectingSink {
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl AuditSink for OverlapDetectingSink {
    fn write(&self, _record: &AuditRecord) -> Result<(), SinkError> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(2));
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
