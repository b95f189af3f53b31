//! Process registry: one mutable entry per configured process.
//!
//! Entries are created once at startup from the configuration and live for
//! the server's entire run; they toggle between running and stopped but are
//! never added or removed. The name-to-entry map is therefore immutable and
//! needs no lock of its own; all mutation of a single entry goes through
//! that entry's `tokio::sync::Mutex`, which is the per-entry single-writer
//! guarantee the lifecycle code relies on.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use procdash_core::config::{ProcessSpec, SupervisorConfig};
use procdash_core::error::SupervisorError;
use procdash_core::logbuf::LogBuffer;

/// Live-run bookkeeping for an entry. Present iff the process is running.
#[derive(Debug, Clone, Copy)]
pub struct RunHandle {
    /// OS process id, used to address termination requests.
    pub pid: u32,
    /// Which run this handle belongs to (see [`ProcessEntry::begin_run`]).
    pub generation: u64,
}

/// Mutable state for one configured process.
#[derive(Debug)]
pub struct ProcessEntry {
    /// Configured name; the entry's identity.
    pub name: String,
    /// Immutable executable path and arguments.
    pub spec: ProcessSpec,
    /// Bounded history of complete lines plus one pending partial.
    pub buffer: LogBuffer,
    run: Option<RunHandle>,
    generation: u64,
}

impl ProcessEntry {
    fn new(name: String, spec: ProcessSpec) -> Self {
        Self {
            name,
            spec,
            buffer: LogBuffer::new(),
            run: None,
            generation: 0,
        }
    }

    /// True while a live run handle is recorded.
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// PID of the current run, if any.
    pub fn run_pid(&self) -> Option<u32> {
        self.run.map(|r| r.pid)
    }

    /// Record a fresh run and return its generation number.
    ///
    /// The generation ties each exit notification to the run it came from:
    /// a watcher for a superseded run must not clobber the state of a newer
    /// one when stop, exit and restart race.
    pub fn begin_run(&mut self, pid: u32) -> u64 {
        self.generation += 1;
        self.run = Some(RunHandle {
            pid,
            generation: self.generation,
        });
        self.generation
    }

    /// Clear the run handle if `generation` still identifies the current
    /// run. Returns false when the notification is stale.
    pub fn end_run(&mut self, generation: u64) -> bool {
        match self.run {
            Some(handle) if handle.generation == generation => {
                self.run = None;
                true
            }
            _ => false,
        }
    }
}

/// Immutable map from process name to its mutable entry.
pub struct Registry {
    entries: HashMap<String, Arc<Mutex<ProcessEntry>>>,
}

impl Registry {
    /// Build the registry from loaded configuration.
    pub fn from_config(config: &SupervisorConfig) -> Self {
        let entries = config
            .processes
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    Arc::new(Mutex::new(ProcessEntry::new(name.clone(), spec.clone()))),
                )
            })
            .collect();
        Self { entries }
    }

    /// Look up an entry by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Mutex<ProcessEntry>>, SupervisorError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| SupervisorError::UnknownProcess(name.to_string()))
    }

    /// Configured process names.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of configured processes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> Registry {
        let mut config = SupervisorConfig::default();
        config.processes.insert(
            "gbc".to_string(),
            ProcessSpec::new("/bin/echo", vec!["hello".to_string()]),
        );
        Registry::from_config(&config)
    }

    #[tokio::test]
    async fn lookup_finds_configured_entry() {
        let registry = test_registry();
        let entry = registry.lookup("gbc").unwrap();
        let entry = entry.lock().await;
        assert_eq!(entry.spec.path, "/bin/echo");
        assert!(!entry.is_running());
    }

    #[test]
    fn lookup_unknown_name_fails() {
        let registry = test_registry();
        assert!(matches!(
            registry.lookup("nope"),
            Err(SupervisorError::UnknownProcess(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn stale_exit_does_not_clear_newer_run() {
        let registry = test_registry();
        let entry = registry.lookup("gbc").unwrap();
        let mut entry = entry.lock().await;

        let first = entry.begin_run(100);
        assert!(entry.end_run(first));
        assert!(!entry.is_running());

        let second = entry.begin_run(200);
        // the watcher of the first run fires late
        assert!(!entry.end_run(first));
        assert_eq!(entry.run_pid(), Some(200));
        assert!(entry.end_run(second));
    }
}
