//! Server bootstrap - the composition root.
//!
//! This is the only place where the registry, supervisor and session
//! manager are wired together. Configuration failures are fatal here,
//! before the listener binds; everything after startup is recoverable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use procdash_core::config::SupervisorConfig;
use procdash_core::ports::EventSink;
use procdash_runtime::{Registry, Supervisor};

use crate::sessions::SessionManager;
use crate::state::{AppState, ServerContext};

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP/WebSocket server.
    pub port: u16,
    /// Path to the JSON process table; None uses the development default.
    pub config_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            config_path: None,
        }
    }
}

/// Load configuration and wire up the shared application context.
pub fn build_context(config: &ServerConfig) -> Result<AppState> {
    let supervisor_config = match &config.config_path {
        Some(path) => SupervisorConfig::load(path).context("loading process configuration")?,
        None => SupervisorConfig::development_default(),
    };

    let registry = Registry::from_config(&supervisor_config);
    info!(
        processes = registry.len(),
        "Process table loaded: {}",
        registry.names().join(", ")
    );

    let sessions = Arc::new(SessionManager::new());
    let supervisor = Arc::new(Supervisor::new(
        registry,
        Arc::clone(&sessions) as Arc<dyn EventSink>,
    ));

    Ok(Arc::new(ServerContext {
        supervisor,
        sessions,
    }))
}

/// Build the context and serve until the process is killed.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = build_context(&config)?;
    let app = crate::routes::create_router(ctx);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
