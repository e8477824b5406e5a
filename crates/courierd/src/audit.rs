//! Best-effort audit records for side-effecting methods.
//!
//! The audit store is an external collaborator: handlers hand it a record
//! and carry on regardless of the outcome. Failures are logged by the caller
//! (see [`crate::methods::HandlerContext::record`]) and never change the
//! response a client receives.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use courier_proto::unix_millis;

/// Tracing target for audit events.
pub(crate) const AUDIT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::audit");

/// Category of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A file was uploaded.
    Upload,
    /// A payment was recorded.
    Payment,
    /// An assignment was submitted.
    Submission,
}

/// A single entry handed to the audit store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Record category.
    pub kind: AuditKind,
    /// Method that produced the record.
    pub method: String,
    /// Correlation identifier of the originating request.
    pub request_id: Option<String>,
    /// Method-specific details.
    pub details: Value,
    /// Milliseconds since the Unix epoch.
    pub recorded_at: i64,
}

impl AuditRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(
        kind: AuditKind,
        method: impl Into<String>,
        request_id: Option<&str>,
        details: Value,
    ) -> Self {
        Self {
            kind,
            method: method.into(),
            request_id: request_id.map(str::to_owned),
            details,
            recorded_at: unix_millis(),
        }
    }
}

/// Errors reported by an audit sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the backing file failed.
    #[error("failed to write audit record to '{path}': {source}")]
    Io {
        /// Backing file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The record could not be serialised.
    #[error("failed to serialise audit record: {0}")]
    Serialise(#[from] serde_json::Error),
    /// The store refused or could not accept the record.
    #[error("audit store unavailable: {message}")]
    Unavailable {
        /// Reason reported by the store.
        message: String,
    },
}

impl SinkError {
    /// Creates an unavailable-store error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Outbound "log record" capability.
pub trait AuditSink: Send + Sync {
    /// Persists one record.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the record could not be stored. Callers
    /// treat this as non-fatal.
    fn write(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// Sink that emits records as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn write(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let details = serde_json::to_string(&record.details)?;
        info!(
            target: AUDIT_TARGET,
            kind = ?record.kind,
            method = %record.method,
            request_id = record.request_id.as_deref().unwrap_or("-"),
            recorded_at = record.recorded_at,
            %details,
            "audit record"
        );
        Ok(())
    }
}

/// Sink that appends records to a file, one JSON object per line.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: Utf8PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    /// Opens (or creates) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] when the file cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_std_path())
            .map_err(|source| SinkError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn write(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&line)
            .and_then(|()| file.flush())
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
