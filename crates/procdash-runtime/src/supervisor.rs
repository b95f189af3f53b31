//! Spawn/stop/exit lifecycle wiring for managed processes.
//!
//! Each running process has three tasks attached to it: one chunk reader
//! per output stream and one exit watcher that owns the `Child`. Readers
//! push raw chunks through the entry's line buffer and emit
//! `multicast/process/log` for whatever lines the chunk committed; the
//! watcher observes exit, waits for both readers to drain, then clears
//! the run handle and emits `multicast/process/exit`. All per-entry
//! mutation happens under the entry's mutex, so chunk fragmentation and
//! stop/restart races cannot corrupt the buffer or double-account a run.

use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use procdash_core::error::SupervisorError;
use procdash_core::ports::EventSink;
use procdash_core::protocol::{Delivery, ServerEvent};

use crate::registry::{ProcessEntry, Registry};
use crate::signal::{exit_message, request_termination};

/// Read size for the stdout/stderr chunk readers.
const CHUNK_SIZE: usize = 4096;

/// Snapshot of one process's state, taken for a newly subscribing client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinInfo {
    pub running: bool,
    pub log: Vec<String>,
    pub path: String,
    pub args: Vec<String>,
}

/// Process controller: owns lifecycle transitions for every registry entry.
pub struct Supervisor {
    registry: Registry,
    events: Arc<dyn EventSink>,
}

impl Supervisor {
    /// Create a supervisor over a registry, emitting events through `events`.
    pub fn new(registry: Registry, events: Arc<dyn EventSink>) -> Self {
        Self { registry, events }
    }

    /// Access to the underlying registry (startup logging, introspection).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start the named process.
    ///
    /// Fails with `AlreadyRunning` when a run handle exists and with
    /// `SpawnFailure` when the OS cannot launch the executable; neither
    /// changes entry state beyond the log reset that precedes the spawn
    /// attempt. On success the (empty) history is multicast as
    /// `process/starting` and the reader/watcher tasks are attached.
    pub async fn start(&self, name: &str) -> Result<(), SupervisorError> {
        let entry_ref = self.registry.lookup(name)?;
        let mut entry = entry_ref.lock().await;

        if entry.is_running() {
            return Err(SupervisorError::AlreadyRunning(name.to_string()));
        }

        entry.buffer.reset();

        let mut child = Command::new(&entry.spec.path)
            .args(&entry.spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::SpawnFailure {
                name: name.to_string(),
                source,
            })?;

        let pid = child.id().ok_or_else(|| SupervisorError::SpawnFailure {
            name: name.to_string(),
            source: std::io::Error::other("child has no PID"),
        })?;

        let generation = entry.begin_run(pid);
        info!(process = %name, pid = %pid, "Process started");

        // Spawn succeeded: announce the run with its freshly reset history.
        self.events
            .deliver(
                Delivery::Multicast(name.to_string()),
                ServerEvent::Starting {
                    process_name: name.to_string(),
                    log: entry.buffer.snapshot(),
                },
            )
            .await;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        drop(entry);

        let mut readers = Vec::with_capacity(2);
        if let Some(stream) = stdout {
            readers.push(self.spawn_chunk_reader(name, "stdout", Arc::clone(&entry_ref), stream));
        }
        if let Some(stream) = stderr {
            readers.push(self.spawn_chunk_reader(name, "stderr", Arc::clone(&entry_ref), stream));
        }
        self.spawn_exit_watcher(name, entry_ref, child, generation, readers);

        Ok(())
    }

    /// Request termination of the named process.
    ///
    /// Best effort: the state transition to stopped happens only when the
    /// exit notification arrives, never synchronously here. A process that
    /// ignores SIGTERM stays "running".
    pub async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let entry_ref = self.registry.lookup(name)?;
        let entry = entry_ref.lock().await;

        let Some(pid) = entry.run_pid() else {
            return Err(SupervisorError::NotRunning(name.to_string()));
        };

        debug!(process = %name, pid = %pid, "Requesting termination");
        request_termination(pid).map_err(|e| {
            warn!(process = %name, pid = %pid, error = %e, "Termination request failed");
            SupervisorError::TerminationRequestFailure(name.to_string())
        })
    }

    /// Snapshot current state for a newly subscribing client.
    ///
    /// Pure read: running flag, full current log history and the static
    /// path/args. History arrives once as a snapshot, never replayed as
    /// individual log events.
    pub async fn join_info(&self, name: &str) -> Result<JoinInfo, SupervisorError> {
        let entry_ref = self.registry.lookup(name)?;
        let entry = entry_ref.lock().await;
        Ok(JoinInfo {
            running: entry.is_running(),
            log: entry.buffer.snapshot(),
            path: entry.spec.path.clone(),
            args: entry.spec.args.clone(),
        })
    }

    fn spawn_chunk_reader(
        &self,
        name: &str,
        stream_type: &'static str,
        entry: Arc<Mutex<ProcessEntry>>,
        mut stream: impl AsyncRead + Unpin + Send + 'static,
    ) -> tokio::task::JoinHandle<()> {
        let events = Arc::clone(&self.events);
        let name = name.to_string();
        tokio::spawn(async move {
            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) => break, // EOF
                    Ok(n) => {
                        let mut entry = entry.lock().await;
                        let lines = entry.buffer.append_chunk(&buf[..n]);
                        if !lines.is_empty() {
                            // Delivered under the entry lock so that emit
                            // order matches commit order even when stdout
                            // and stderr interleave in the shared buffer.
                            events
                                .deliver(
                                    Delivery::Multicast(name.clone()),
                                    ServerEvent::Log {
                                        process_name: name.clone(),
                                        lines,
                                    },
                                )
                                .await;
                        }
                    }
                    Err(e) => {
                        debug!(process = %name, %stream_type, error = %e, "chunk reader exiting on read error");
                        break;
                    }
                }
            }
            debug!(process = %name, %stream_type, "chunk reader task exiting");
        })
    }

    fn spawn_exit_watcher(
        &self,
        name: &str,
        entry: Arc<Mutex<ProcessEntry>>,
        mut child: Child,
        generation: u64,
        readers: Vec<tokio::task::JoinHandle<()>>,
    ) {
        let events = Arc::clone(&self.events);
        let name = name.to_string();
        tokio::spawn(async move {
            let message = match child.wait().await {
                Ok(status) => exit_message(status),
                Err(e) => {
                    warn!(process = %name, error = %e, "Failed waiting for process exit");
                    "Process exited".to_string()
                }
            };

            // Let both readers hit EOF and commit their final lines before
            // the history is cleared, so no log event follows the exit
            // event and a post-exit snapshot is always empty.
            for reader in readers {
                let _ = reader.await;
            }

            let mut entry = entry.lock().await;
            if !entry.end_run(generation) {
                // A newer run owns this entry; the notification is stale.
                debug!(process = %name, generation, "Ignoring stale exit notification");
                return;
            }
            entry.buffer.reset();
            info!(process = %name, %message, "Process exited");

            events
                .deliver(
                    Delivery::Multicast(name.clone()),
                    ServerEvent::Exit {
                        process_name: name.clone(),
                        message,
                    },
                )
                .await;
        });
    }
}
