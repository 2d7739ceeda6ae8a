use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Every way a delivery can end without its side effect completing.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("payload is missing {0}")]
    MissingField(&'static str),

    #[error("refusing unsafe repository name {0:?}")]
    UnsafeRepositoryName(String),

    #[error("refusing clone url {0:?}")]
    UnsafeCloneUrl(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{op} {path:?} failed: {source}")]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
