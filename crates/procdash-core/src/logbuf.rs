//! Bounded line buffer for process output.
//!
//! Pipe reads do not align with line boundaries, so raw chunks are
//! accumulated in a partial-line buffer and only committed to history once a
//! newline arrives. Observers therefore see whole lines, in order, exactly
//! once, regardless of how the OS fragments the stream. History keeps the
//! most recent `MAX_LOG_LINES` lines; the oldest are evicted first.
//!
//! Child processes can emit non-UTF8 bytes; chunks are decoded lossily
//! rather than terminating the reader on invalid input.

use std::collections::VecDeque;

/// Maximum number of committed lines retained per process.
pub const MAX_LOG_LINES: usize = 100;

/// Ring of recent complete lines plus one pending partial line.
#[derive(Debug, Default)]
pub struct LogBuffer {
    /// Complete lines since the process last (re)started, oldest first.
    history: VecDeque<String>,
    /// Bytes received since the last newline. Never contains `\n`.
    partial: String,
}

impl LogBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_LOG_LINES),
            partial: String::new(),
        }
    }

    /// Append a raw chunk and return exactly the lines committed by it.
    ///
    /// The chunk is appended to the pending partial line, which is then
    /// split on `\n`: every piece except the last becomes a committed line,
    /// the last piece (possibly empty) becomes the new partial. Returns an
    /// empty vec when the chunk contained no newline.
    pub fn append_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.partial.push_str(&String::from_utf8_lossy(chunk));
        if !self.partial.contains('\n') {
            return Vec::new();
        }

        let mut pieces: Vec<String> = self.partial.split('\n').map(str::to_owned).collect();
        // split always yields at least one piece when a newline was present
        self.partial = pieces.pop().unwrap_or_default();

        for line in &pieces {
            if self.history.len() >= MAX_LOG_LINES {
                self.history.pop_front();
            }
            self.history.push_back(line.clone());
        }
        pieces
    }

    /// Clear history and the pending partial. Called on process (re)start
    /// and on exit.
    pub fn reset(&mut self) {
        self.history.clear();
        self.partial.clear();
    }

    /// Copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    /// Number of committed lines currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no lines have been committed.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The pending partial line (test and snapshot introspection).
    pub fn partial(&self) -> &str {
        &self.partial
    }
}
