//! Configuration loading for the `courier` binary.
//!
//! Leading flags recognised by [`courier_config::Config`] are handed to
//! `ortho_config`; the first token that is not one of them starts the
//! subcommand parsed by `clap`.

use std::ffi::{OsStr, OsString};

use courier_config::Config;

use crate::AppError;

/// Configuration flags accepted ahead of the subcommand.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--listen",
    "--auth-token",
    "--call-timeout-secs",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

/// Arguments divided between the configuration loader and the call parser.
///
/// Both halves keep the program name as their first element.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config: Vec<OsString>,
    pub(crate) call: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let mut parts = text.splitn(2, '=');
    let flag = parts.next().unwrap_or_default();
    let has_inline_value = parts.next().is_some();
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

pub(crate) fn split_arguments(args: Vec<OsString>) -> ArgumentSplit {
    let mut split = ArgumentSplit::default();
    let mut tokens = args.into_iter().peekable();
    if let Some(program) = tokens.next() {
        split.config.push(program.clone());
        split.call.push(program);
    }

    while let Some(argument) = tokens.next_if(|token| classify(token) != FlagAction::Stop) {
        let needs_value = classify(&argument) == FlagAction::Include { needs_value: true };
        split.config.push(argument);
        if needs_value && let Some(value) = tokens.next() {
            split.config.push(value);
        }
    }

    split.call.extend(tokens);
    split
}
