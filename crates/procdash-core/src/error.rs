//! Error taxonomy for the supervisor.
//!
//! Every `SupervisorError` variant is a per-request failure: it is reported
//! back to the requesting client as a `unicast/process/error` event and
//! never crashes the server or touches other processes. Only `ConfigError`
//! is fatal, and only at startup.
//!
//! The `Display` strings double as the client-visible `message` field, so
//! the established dashboard wording is load-bearing here.

use thiserror::Error;

/// Per-request supervisor failures, surfaced to the requester only.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The requested name is not in the configured process table.
    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    /// Start requested while the process already has a live run handle.
    #[error("Process already started")]
    AlreadyRunning(String),

    /// Stop requested while the process has no live run handle.
    #[error("Process not started")]
    NotRunning(String),

    /// The OS failed to launch the executable.
    #[error("Failed to spawn process: {source}")]
    SpawnFailure {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The termination request itself could not be issued. The process is
    /// still considered running until an exit notification arrives.
    #[error("Failed to kill process")]
    TerminationRequestFailure(String),
}

impl SupervisorError {
    /// The process name this failure refers to.
    pub fn process_name(&self) -> &str {
        match self {
            Self::UnknownProcess(name)
            | Self::AlreadyRunning(name)
            | Self::NotRunning(name)
            | Self::TerminationRequestFailure(name) => name,
            Self::SpawnFailure { name, .. } => name,
        }
    }
}

/// Fatal configuration failures. The server exits before binding.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
