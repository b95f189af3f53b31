//! Core domain types for procdash.
//!
//! This crate defines everything the supervisor and the network adapter
//! share: the configuration model, the error taxonomy, the wire protocol,
//! the bounded line buffer, and the `EventSink` port through which process
//! lifecycle events leave the runtime.
//!
//! No adapter concerns live here - no axum, no child processes, no signals.

pub mod config;
pub mod error;
pub mod logbuf;
pub mod ports;
pub mod protocol;

// Re-export primary types
pub use config::{ProcessSpec, SupervisorConfig};
pub use error::{ConfigError, SupervisorError};
pub use logbuf::LogBuffer;
pub use ports::EventSink;
pub use protocol::{ClientRequest, Delivery, ServerEvent, SessionId};
