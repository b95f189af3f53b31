//! Axum adapter for procdash.
//!
//! Exposes the supervisor over one persistent WebSocket per client. The
//! session manager tracks connected clients and their per-process
//! subscriptions and implements the `EventSink` port, so runtime events fan
//! out to exactly the sessions that asked for them.

pub mod bootstrap;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod ws;

// Re-export primary types
pub use bootstrap::{ServerConfig, build_context, start_server};
pub use sessions::SessionManager;
pub use state::{AppState, ServerContext};
