//! In-process server bound to an ephemeral localhost port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use courier_config::{Config, SocketEndpoint};

use crate::audit::AuditSink;
use crate::dispatch::DispatcherStats;
use crate::methods::MethodRegistry;
use crate::server::{Server, ServerComponents};

use super::{RecordingObserver, TestClient};

pub const TEST_TOKEN: &str = "T";

/// Polls `condition` every few milliseconds until it holds or `timeout`
/// elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub struct TestServer {
    server: Option<Server>,
    addr: SocketAddr,
    pub observer: Arc<RecordingObserver>,
}

impl TestServer {
    pub fn config(execution_delay: Duration) -> Config {
        Config {
            listen: SocketEndpoint::tcp("127.0.0.1", 0),
            auth_token: TEST_TOKEN.to_owned(),
            execution_delay_ms: u64::try_from(execution_delay.as_millis()).expect("delay fits"),
            ..Config::default()
        }
    }

    pub fn start(audit: Arc<dyn AuditSink>) -> Self {
        Self::start_with(Self::config(Duration::ZERO), audit, |_| {})
    }

    pub fn start_with(
        config: Config,
        audit: Arc<dyn AuditSink>,
        customise: impl FnOnce(&mut MethodRegistry),
    ) -> Self {
        let observer = Arc::new(RecordingObserver::default());
        let mut registry = MethodRegistry::standard(audit);
        customise(&mut registry);
        let server = Server::start(
            &config,
            ServerComponents {
                registry,
                observer: observer.clone(),
            },
        )
        .expect("start test server");
        let addr = server.local_addr().expect("tcp listener address");
        Self {
            server: Some(server),
            addr,
            observer,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connect(&self) -> TestClient {
        TestClient::connect(self.addr)
    }

    pub fn stats(&self) -> DispatcherStats {
        self.server.as_ref().expect("server running").stats()
    }

    pub fn shutdown(mut self) {
        if let Some(server) = self.server.take() {
            server.shutdown().expect("server shutdown");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            let _ = server.shutdown();
        }
    }
}
