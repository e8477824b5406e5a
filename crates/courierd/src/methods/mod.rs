//! Method registry and the built-in handlers.
//!
//! The registry maps a wire method name to a [`MethodHandler`]. It is
//! populated once at startup and then only read by the dispatcher, so
//! lookups need no locking. Unknown names fail closed with
//! [`MethodError::UnknownMethod`].
//!
//! Handlers receive the request body untouched and validate only the fields
//! they use. A handler may record one audit entry through
//! [`HandlerContext::record`]; failures of the audit store are logged there
//! and never reach the caller.

mod academics;
mod accounts;
mod arguments;
mod errors;
mod files;
mod system;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::warn;

use courier_proto::Body;

use crate::audit::{AUDIT_TARGET, AuditKind, AuditRecord, AuditSink};

pub use self::errors::MethodError;
pub use self::files::{FileCatalog, FileEntry};

/// Per-call view handed to a handler.
pub struct HandlerContext<'a> {
    method: &'a str,
    request_id: Option<&'a str>,
    audit: &'a dyn AuditSink,
}

impl<'a> HandlerContext<'a> {
    /// Builds a context for one invocation.
    pub fn new(method: &'a str, request_id: Option<&'a str>, audit: &'a dyn AuditSink) -> Self {
        Self {
            method,
            request_id,
            audit,
        }
    }

    /// Name of the method being executed.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method
    }

    /// Correlation identifier of the request, if supplied.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id
    }

    /// Writes an audit record, logging and discarding any failure.
    pub fn record(&self, kind: AuditKind, details: Value) {
        let record = AuditRecord::new(kind, self.method, self.request_id, details);
        if let Err(error) = self.audit.write(&record) {
            warn!(
                target: AUDIT_TARGET,
                method = self.method,
                request_id = self.request_id.unwrap_or("-"),
                %error,
                "audit write failed; continuing"
            );
        }
    }
}

/// A callable bound to a method name.
pub trait MethodHandler: Send + Sync {
    /// Executes the method against `body`.
    ///
    /// # Errors
    ///
    /// Returns a [`MethodError`] that the dispatcher turns into an `ERROR`
    /// response.
    fn call(&self, context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError>;
}

struct FnHandler<F>(F);

impl<F> MethodHandler for FnHandler<F>
where
    F: Fn(&HandlerContext<'_>, &Body) -> Result<Value, MethodError> + Send + Sync,
{
    fn call(&self, context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
        (self.0)(context, body)
    }
}

/// Name-to-handler table consulted by the dispatcher.
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
    audit: Arc<dyn AuditSink>,
}

impl MethodRegistry {
    /// Creates an empty registry writing audit records to `audit`.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            handlers: HashMap::new(),
            audit,
        }
    }

    /// Creates a registry holding every built-in method.
    #[must_use]
    pub fn standard(audit: Arc<dyn AuditSink>) -> Self {
        let mut registry = Self::new(audit);
        system::register(&mut registry, Instant::now());
        files::register(&mut registry, Arc::new(FileCatalog::default()));
        accounts::register(&mut registry);
        academics::register(&mut registry);
        registry
    }

    /// Binds `handler` to `method`, replacing any previous binding.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H) -> &mut Self
    where
        H: MethodHandler + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    /// Binds a closure to `method`.
    pub fn register_fn<F>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>, &Body) -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        self.register(method, FnHandler(handler))
    }

    /// Returns `true` when a handler is bound to `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names in lexical order.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invokes the handler bound to `method`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::UnknownMethod`] when nothing is bound to
    /// `method`, otherwise whatever the handler returns.
    pub fn dispatch(
        &self,
        method: &str,
        request_id: Option<&str>,
        body: &Body,
    ) -> Result<Value, MethodError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| MethodError::unknown_method(method))?;
        let context = HandlerContext::new(method, request_id, self.audit.as_ref());
        handler.call(&context, body)
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish_non_exhaustive()
    }
}
