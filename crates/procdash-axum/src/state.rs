//! Shared application state type.

use std::sync::Arc;

use procdash_runtime::Supervisor;

use crate::sessions::SessionManager;

/// Services shared by every handler and connection task.
pub struct ServerContext {
    /// Process controller over the configured registry.
    pub supervisor: Arc<Supervisor>,
    /// Connected clients and their subscriptions.
    pub sessions: Arc<SessionManager>,
}

/// Application state shared across all handlers.
pub type AppState = Arc<ServerContext>;
