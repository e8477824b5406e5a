//! Calls made through the caller-side stub against a running daemon.

use std::sync::Arc;
use std::time::Duration;

use courier_cli::{Stub, StubError};
use courier_config::SocketEndpoint;
use courier_proto::{Body, Status};
use serde_json::{Value, json};

use super::support::{Gate, RecordingAuditSink, TEST_TOKEN, TestServer, wait_until};
use crate::methods::HandlerContext;

fn endpoint(server: &TestServer) -> SocketEndpoint {
    let addr = server.addr();
    SocketEndpoint::tcp(addr.ip().to_string(), addr.port())
}

fn body(value: &Value) -> Body {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn stub_uploads_then_lists_files() {
    let audit = Arc::new(RecordingAuditSink::default());
    let server = TestServer::start(audit.clone());
    let mut stub =
        Stub::connect(&endpoint(&server), TEST_TOKEN, Duration::from_secs(5)).expect("connect");

    let upload = stub
        .call(
            "UPLOAD_FILE",
            body(&json!({ "filename": "notes.txt", "content": "hello" })),
        )
        .expect("upload");
    assert_eq!(upload.status, Status::Ok);
    assert_eq!(upload.result["size"], 5);

    let listing = stub.call("LIST_FILES", Body::new()).expect("list");
    assert_eq!(listing.result["count"], 1);
    assert_eq!(audit.records().len(), 1);
}

#[test]
fn stub_surfaces_authentication_failures_as_responses() {
    let server = TestServer::start(Arc::new(RecordingAuditSink::default()));
    let mut stub =
        Stub::connect(&endpoint(&server), "wrong", Duration::from_secs(5)).expect("connect");

    let response = stub.call("PING", Body::new()).expect("call");

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error.as_deref(), Some("Authentication failed"));
}

#[test]
fn stub_timeout_leaves_the_job_running() {
    let gate = Arc::new(Gate::default());
    let held = Arc::clone(&gate);
    let server = TestServer::start_with(
        TestServer::config(Duration::ZERO),
        Arc::new(RecordingAuditSink::default()),
        move |registry| {
            registry.register_fn("HOLD", move |_: &HandlerContext<'_>, _: &Body| {
                held.hold();
                Ok(json!({ "held": true }))
            });
        },
    );
    let mut stub =
        Stub::connect(&endpoint(&server), TEST_TOKEN, Duration::from_millis(150)).expect("connect");

    let error = stub.call("HOLD", Body::new()).expect_err("should time out");
    assert!(matches!(error, StubError::Timeout { .. }));
    assert!(gate.wait_entered(Duration::from_secs(5)));

    gate.release();
    let mut late = Stub::connect(&endpoint(&server), TEST_TOKEN, Duration::from_secs(5))
        .expect("reconnect");
    assert_eq!(late.call("PING", Body::new()).expect("ping").status, Status::Ok);
    assert!(wait_until(Duration::from_secs(5), || server.stats().completed == 2));
}

#[cfg(unix)]
#[test]
fn stub_calls_over_a_unix_socket() {
    use crate::dispatch::TracingExecutionObserver;
    use crate::methods::MethodRegistry;
    use crate::server::{Server, ServerComponents};

    let dir = tempfile::tempdir().expect("temp dir");
    let socket = dir.path().join("courierd.sock");
    let endpoint = SocketEndpoint::unix(socket.to_str().expect("utf8 path"));
    let config = courier_config::Config {
        listen: endpoint.clone(),
        ..TestServer::config(Duration::ZERO)
    };
    let server = Server::start(
        &config,
        ServerComponents {
            registry: MethodRegistry::standard(Arc::new(RecordingAuditSink::default())),
            observer: Arc::new(TracingExecutionObserver),
        },
    )
    .expect("start unix server");

    let mut stub = Stub::connect(&endpoint, TEST_TOKEN, Duration::from_secs(5)).expect("connect");
    let response = stub.call("PING", Body::new()).expect("ping");

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.result["pong"], true);
    server.shutdown().expect("server shutdown");
}
