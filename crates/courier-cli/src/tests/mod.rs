//! Stub and runner tests against a scripted daemon.


use std::ffi::OsString;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use courier_config::{Config, SocketEndpoint};
use courier_proto::{Body, Status};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use self::fake_daemon::{FakeDaemon, Reply};
use crate::{AppError, ConfigLoader, Stub, StubError, run_with_loader};

const TOKEN: &str = "T";

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

fn config_for(endpoint: SocketEndpoint) -> Config {
    Config {
        listen: endpoint,
        auth_token: TOKEN.to_owned(),
        call_timeout_secs: 2,
        ..Config::default()
    }
}

fn body(value: &Value) -> Body {
    value.as_object().cloned().unwrap_or_default()
}

struct Captured {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run_cli(config: Config, args: &[&str]) -> Captured {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let loader = StaticConfigLoader { config };
    let argv = std::iter::once("courier")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = run_with_loader(argv, &mut stdout, &mut stderr, &loader);
    Captured {
        exit,
        stdout: String::from_utf8(stdout).expect("utf8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf8 stderr"),
    }
}

#[fixture]
fn timeout() -> Duration {
    Duration::from_secs(2)
}

#[rstest]
#[case::plain(Reply::Echo)]
#[case::interleaved(Reply::InterleavedEcho)]
#[case::fragmented(Reply::Fragmented)]
fn call_returns_the_correlated_response(timeout: Duration, #[case] reply: Reply) {
    let daemon = FakeDaemon::spawn(reply, 1).expect("spawn daemon");
    let mut stub = Stub::connect(&daemon.endpoint(), TOKEN, timeout).expect("connect");

    let response = stub
        .call("UPLOAD_FILE", body(&json!({ "filename": "a.txt" })))
        .expect("call");

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.result["method"], "UPLOAD_FILE");
    assert_eq!(response.result["body"]["filename"], "a.txt");
    let requests = daemon.requests().expect("requests");
    assert_eq!(requests.len(), 1);
    let request = requests.first().expect("one request");
    assert_eq!(request.header.auth_token.as_deref(), Some(TOKEN));
    assert_eq!(request.request_id(), response.request_id.as_deref());
}

#[rstest]
fn consecutive_calls_use_distinct_request_ids(timeout: Duration) {
    let daemon = FakeDaemon::spawn(Reply::Echo, 2).expect("spawn daemon");
    let mut stub = Stub::connect(&daemon.endpoint(), TOKEN, timeout).expect("connect");

    let first = stub.call("PING", Body::new()).expect("first call");
    let second = stub.call("PING", Body::new()).expect("second call");

    assert_ne!(first.request_id, second.request_id);
    assert_eq!(daemon.requests().expect("requests").len(), 2);
}

#[rstest]
fn error_responses_are_returned_not_raised(timeout: Duration) {
    let daemon = FakeDaemon::spawn(Reply::Reject, 1).expect("spawn daemon");
    let mut stub = Stub::connect(&daemon.endpoint(), TOKEN, timeout).expect("connect");

    let response = stub.call("PING", Body::new()).expect("call");

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error.as_deref(), Some("Authentication failed"));
}

#[test]
fn silent_daemon_times_out_after_the_bound() {
    let daemon = FakeDaemon::spawn(Reply::Silent, 1).expect("spawn daemon");
    let bound = Duration::from_millis(200);
    let mut stub = Stub::connect(&daemon.endpoint(), TOKEN, bound).expect("connect");

    let started = Instant::now();
    let error = stub.call("PING", Body::new()).expect_err("should time out");

    assert!(matches!(error, StubError::Timeout { timeout, .. } if timeout == bound));
    assert!(started.elapsed() >= bound);
    assert!(started.elapsed() < Duration::from_secs(2));
    drop(stub);
    assert_eq!(daemon.requests().expect("requests").len(), 1);
}

#[rstest]
fn hangup_reports_closed(timeout: Duration) {
    let daemon = FakeDaemon::spawn(Reply::Hangup, 1).expect("spawn daemon");
    let mut stub = Stub::connect(&daemon.endpoint(), TOKEN, timeout).expect("connect");

    let error = stub.call("PING", Body::new()).expect_err("should fail");

    assert!(matches!(error, StubError::Closed { .. }));
}

#[rstest]
fn unreachable_daemon_reports_connect_error(timeout: Duration) {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let error = Stub::connect(&SocketEndpoint::tcp("127.0.0.1", port), TOKEN, timeout)
        .expect_err("should fail");

    assert!(matches!(error, StubError::Connect { .. }));
}

#[test]
fn runner_prints_response_json() {
    let daemon = FakeDaemon::spawn(Reply::Echo, 1).expect("spawn daemon");
    let captured = run_cli(
        config_for(daemon.endpoint()),
        &["call", "CHECK_BALANCE", "--body", r#"{"account_id":"ACC-1"}"#],
    );

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    let printed: Value = serde_json::from_str(captured.stdout.trim()).expect("json output");
    assert_eq!(printed["status"], "OK");
    assert_eq!(printed["result"]["body"]["account_id"], "ACC-1");
    assert!(captured.stderr.is_empty());
}

#[test]
fn runner_fails_on_error_status() {
    let daemon = FakeDaemon::spawn(Reply::Reject, 1).expect("spawn daemon");
    let captured = run_cli(config_for(daemon.endpoint()), &["call", "PING"]);

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stdout.contains("Authentication failed"));
}

#[rstest]
#[case::not_json("{nope", "request body must be a JSON object")]
#[case::array("[1]", "got an array")]
fn runner_rejects_bad_bodies(#[case] body: &str, #[case] message: &str) {
    let captured = run_cli(
        config_for(SocketEndpoint::tcp("127.0.0.1", 9)),
        &["call", "PING", "--body", body],
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stderr.contains(message), "stderr: {}", captured.stderr);
}

#[test]
fn runner_requires_a_method() {
    let captured = run_cli(config_for(SocketEndpoint::tcp("127.0.0.1", 9)), &["call"]);

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stderr.contains("METHOD"));
}
