//! Process supervision runtime for procdash.
//!
//! This crate owns the spawn/stop/exit lifecycle of the configured
//! processes. The [`Registry`] holds one mutable entry per configured name;
//! the [`Supervisor`] drives lifecycle transitions and pushes stdout/stderr
//! chunks through each entry's line buffer, emitting events through the
//! `EventSink` port defined in `procdash-core`.

pub mod registry;
pub mod signal;
pub mod supervisor;

// Re-export commonly used types
pub use registry::{ProcessEntry, Registry};
pub use supervisor::{JoinInfo, Supervisor};
