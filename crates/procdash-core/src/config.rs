//! Supervisor configuration: the static mapping of process name to command.
//!
//! The config file is a JSON object keyed by process name. Older dashboard
//! config files also carry `log`/`logbuf` keys per entry; serde ignores
//! unknown fields so those files keep working.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;

/// Command line for one managed process. Immutable after load.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Path to the executable.
    pub path: String,
    /// Arguments passed to the executable, in order.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(path: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            path: path.into(),
            args,
        }
    }
}

/// The full set of managed processes, loaded once at startup.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct SupervisorConfig {
    /// Process name -> command. BTreeMap keeps listing order stable.
    pub processes: BTreeMap<String, ProcessSpec>,
}

impl SupervisorConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing or malformed file is fatal at startup (`ConfigError`);
    /// the server must not accept connections with a partial process table.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Hard coded config for use in development when no file is given.
    pub fn development_default() -> Self {
        warn!("No config file specified, using hard coded config");
        let mut processes = BTreeMap::new();
        processes.insert(
            "gbc".to_string(),
            ProcessSpec::new("/tmp/gbc_deploy/cmake-build-debug/GBC", Vec::new()),
        );
        processes.insert(
            "gbem".to_string(),
            ProcessSpec::new("/tmp/gbem_deploy/cmake-build-debug/GBEM", Vec::new()),
        );
        Self { processes }
    }
}
