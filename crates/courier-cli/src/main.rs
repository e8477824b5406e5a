//! Command-line entrypoint for the courier stub.
//!
//! Delegates to [`courier_cli::run`], which loads configuration, performs a
//! single call, and prints the response JSON.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    courier_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
