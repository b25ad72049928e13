//! Edge API gateway.
//!
//! Single public entry point in front of the auth, analysis and converter
//! services.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                  EDGE GATEWAY                  │
//!   Client Request    │  ┌────────┐  ┌──────┐  ┌──────┐  ┌──────────┐  │
//!   ──────────────────┼─▶│ origin │─▶│ route│─▶│ auth │─▶│permission│  │
//!                     │  └────────┘  └──────┘  └──────┘  └────┬─────┘  │
//!                     │                                       ▼        │
//!   Client Response   │  ┌────────┐           ┌──────────────────────┐ │
//!   ◀─────────────────┼──│ relay  │◀──────────│ rewrite + forward    │◀┼── auth / analysis /
//!                     │  └────────┘           └──────────────────────┘ │   converter
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{self, CONFIG_PATH_VAR};
use edge_gateway::lifecycle::{shutdown_signal, Shutdown};
use edge_gateway::observability::{init_metrics, init_tracing};
use edge_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "edge-gateway", version, about = "Edge API gateway", long_about = None)]
struct Args {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long, env = CONFIG_PATH_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before argument parsing so `.env` can supply `GATEWAY_CONFIG` too.
    let dotenv = config::load_dotenv();
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref())?;
    init_tracing(&config.observability);
    if let Some(path) = &dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        allowed_origins = ?config.cors.allowed_origins,
        services = ?config.services.keys().collect::<Vec<_>>(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        let draining = shutdown.trigger();
        tracing::info!(subscribers = draining, "Shutdown triggered");
    });

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
