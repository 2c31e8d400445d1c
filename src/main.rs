//! Mesh service node (v0.1)
//!
//! Runs the built-in echo handler as a mesh service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    SERVICE NODE                       │
//!    Client            │  ┌──────────┐   PendingConnection   ┌──────────────┐  │
//!    ──────────────────┼─▶│   net    │──────────────────────▶│              │  │
//!                      │  │ listener │                       │   service    │  │
//!                      │  └──────────┘   register/unregister │    actor     │  │
//!    ServiceHandle ────┼──────────────────────────────────────▶│  (one task)  │  │
//!    Signals ──────────┼─▶ lifecycle::signals ── shutdown ────▶│              │  │
//!                      │                                       └──┬────────┬──┘  │
//!                      │                       handshake + spawn  │        │     │
//!                      │                     ┌────────────────────┘        │     │
//!                      │                     ▼                             ▼     │
//!                      │             ┌──────────────┐          ┌─────────────────┐│
//!    ◀─────────────────┼─────────────│ serving task │          │lifecycle manager││
//!                      │             │  (per conn)  │          └────────┬────────┘│
//!                      │             └──────────────┘                   │         │
//!                      └────────────────────────────────────────────────┼─────────┘
//!                                                                       ▼
//!                                                                   directory
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use mesh_service::config::{load_config, ServiceConfig};
use mesh_service::observability::{logging::init_logging, metrics::init_metrics};
use mesh_service::service::{EchoHandler, LoggingDelegate};
use mesh_service::{InMemoryDirectory, Service};

#[derive(Parser)]
#[command(name = "mesh-service")]
#[command(about = "Run an echo service node", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Register with the directory as soon as the listener is up.
    #[arg(short, long)]
    register: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability.log_level);
    tracing::info!("mesh-service v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        name = %config.service.name,
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = Service::new(config, Arc::new(EchoHandler), Arc::new(InMemoryDirectory::new()))
        .with_delegate(Arc::new(LoggingDelegate));

    let handle = service.start(cli.register).await?;
    handle.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
