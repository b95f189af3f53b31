//! Server entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use procdash_axum::{ServerConfig, start_server};

/// Remote process supervisor with live log streaming.
#[derive(Parser)]
#[command(name = "procdash", version)]
struct Cli {
    /// Path to the JSON process configuration file.
    /// Omit to use the hard coded development config.
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    start_server(ServerConfig {
        port: cli.port,
        config_path: cli.config,
    })
    .await
}
