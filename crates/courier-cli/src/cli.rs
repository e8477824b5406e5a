//! Argument definitions for the `courier` binary.

use clap::{Parser, Subcommand};

/// Invokes methods on the courier daemon.
///
/// Configuration flags (`--listen`, `--auth-token`, `--call-timeout-secs`,
/// `--config-path`) must precede the subcommand.
#[derive(Parser, Debug)]
#[command(name = "courier", disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Performs one call and prints the response as JSON.
    Call {
        /// Method to invoke (for example `PING`).
        #[arg(value_name = "METHOD")]
        method: String,
        /// JSON object passed as the request body.
        #[arg(long, value_name = "JSON", default_value = "{}")]
        body: String,
    },
}
