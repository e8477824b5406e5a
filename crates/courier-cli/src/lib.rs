//! Stub client for the courier daemon.
//!
//! [`Stub`] hides the wire protocol behind a blocking call: it frames a
//! request, writes it, and reads until the response with the same
//! `request_id` arrives or the caller-side timeout elapses. The `courier`
//! binary wraps one such call behind [`run`].

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use courier_config::Config;
use courier_proto::{Body, Response};
use serde_json::Value;

mod cli;
mod config;
mod errors;
mod stub;
mod transport;

use cli::{Cli, CliCommand};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
pub(crate) use errors::AppError;
pub use errors::StubError;
pub use stub::{Stub, next_request_id};

/// Runs the CLI with the process arguments, writing to the given streams.
///
/// Exits successfully only when the daemon answered with status `OK`.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let split = split_arguments(args.into_iter().collect());
    let result = Cli::try_parse_from(split.call)
        .map_err(AppError::CliUsage)
        .and_then(|cli| loader.load(&split.config).map(|config| (cli, config)))
        .and_then(|(cli, config)| {
            let response = invoke(&cli, &config)?;
            print_response(&response, stdout)?;
            Ok(response)
        });

    match result {
        Ok(response) if response.is_ok() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn invoke(cli: &Cli, config: &Config) -> Result<Response, AppError> {
    match &cli.command {
        CliCommand::Call { method, body } => {
            let body = parse_body(body)?;
            let mut stub =
                Stub::connect(config.listen(), config.auth_token(), config.call_timeout())?;
            Ok(stub.call(method, body)?)
        }
    }
}

fn parse_body(text: &str) -> Result<Body, AppError> {
    match serde_json::from_str(text).map_err(AppError::InvalidBody)? {
        Value::Object(body) => Ok(body),
        Value::Null => Err(AppError::BodyNotObject { kind: "null" }),
        Value::Bool(_) => Err(AppError::BodyNotObject { kind: "a boolean" }),
        Value::Number(_) => Err(AppError::BodyNotObject { kind: "a number" }),
        Value::String(_) => Err(AppError::BodyNotObject { kind: "a string" }),
        Value::Array(_) => Err(AppError::BodyNotObject { kind: "an array" }),
    }
}

fn print_response<W: Write>(response: &Response, stdout: &mut W) -> Result<(), AppError> {
    let text = serde_json::to_string(response).map_err(AppError::SerialiseResponse)?;
    writeln!(stdout, "{text}").map_err(AppError::WriteResponse)
}

#[cfg(test)]
mod tests;
