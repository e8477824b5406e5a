//! Integration tests for the `courier` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn missing_method_exits_with_usage_error() {
    let mut command = cargo_bin_cmd!("courier");
    command.arg("call");
    command
        .assert()
        .failure()
        .stderr(contains("METHOD"));
}

#[test]
fn unreachable_daemon_exits_with_failure() {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let mut command = cargo_bin_cmd!("courier");
    command.args([
        "--listen",
        &format!("tcp://127.0.0.1:{port}"),
        "--call-timeout-secs",
        "1",
        "call",
        "PING",
    ]);
    command
        .assert()
        .failure()
        .stderr(contains("failed to connect to daemon"));
}

#[test]
fn help_lists_the_body_flag() {
    let mut command = cargo_bin_cmd!("courier");
    command.args(["call", "--help"]);
    command.assert().success().stdout(contains("--body"));
}
