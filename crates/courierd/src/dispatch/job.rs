//! Admitted requests awaiting execution.

use std::time::Instant;

use courier_proto::{Body, Request};

use super::connection::ConnectionRef;

/// A request that passed authentication, bound to its originating connection.
#[derive(Debug)]
pub struct Job {
    method: String,
    body: Body,
    request_id: Option<String>,
    connection: ConnectionRef,
    received_at: Instant,
}

impl Job {
    /// Builds a job from an admitted request.
    #[must_use]
    pub fn new(request: Request, connection: ConnectionRef) -> Self {
        let method = request.method().to_owned();
        let Request { header, body } = request;
        Self {
            method,
            body,
            request_id: header.request_id,
            connection,
            received_at: Instant::now(),
        }
    }

    /// Method name to dispatch.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Method arguments.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Correlation identifier echoed in the response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Connection the response is written to.
    #[must_use]
    pub fn connection(&self) -> &ConnectionRef {
        &self.connection
    }

    /// When the job was admitted.
    #[must_use]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}
