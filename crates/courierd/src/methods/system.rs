//! Liveness probe.

use std::time::Instant;

use serde_json::{Value, json};

use courier_proto::{Body, Method, unix_millis};

use super::{HandlerContext, MethodError, MethodHandler, MethodRegistry};

pub(super) fn register(registry: &mut MethodRegistry, started: Instant) {
    registry.register(Method::Ping.as_str(), Ping { started });
}

/// `PING`: reports liveness and uptime.
struct Ping {
    started: Instant,
}

impl MethodHandler for Ping {
    fn call(&self, _context: &HandlerContext<'_>, _body: &Body) -> Result<Value, MethodError> {
        let uptime_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(json!({
            "pong": true,
            "uptime_ms": uptime_ms,
            "server_time": unix_millis(),
        }))
    }
}
