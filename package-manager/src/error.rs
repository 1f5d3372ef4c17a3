//! Error types for detection, rendering and dispatch

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::agent::{Dialect, Intent};

/// Fatal detection failures. "Not found" is never one of these.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("`{value}` is not a known package manager")]
    UnknownManager { value: String },

    #[error("{origin} names `{value}`, which is not a known package manager")]
    InvalidOverride { value: String, origin: &'static str },

    #[error("no package manager detected")]
    NoManagerDetected,
}

/// Why a yarn version could not be classified. Always recoverable.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("could not query the version of `{program}`")]
    Unavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{output}` is not a version")]
    Unparseable { output: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no command template for `{intent}` with {dialect}")]
    MissingTemplate { dialect: Dialect, intent: Intent },

    #[error("`{intent}` with {dialect} requires a {parameter}")]
    MissingParameter {
        dialect: Dialect,
        intent: Intent,
        parameter: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error("could not read a command from the terminal")]
    Input(#[source] io::Error),

    #[error("no command entered")]
    Cancelled,

    #[error("`{input}` is not an install command, expected `{expected}`")]
    Invalid {
        input: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
#[error("failed to write dependency hash to {path}")]
pub struct CacheError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Terminal failure of the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Interactive(#[from] InteractiveError),

    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed{}", exit_suffix(.code))]
    CommandFailed { command: String, code: Option<i32> },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}
