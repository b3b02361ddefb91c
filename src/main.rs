//! Domain gateway
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ negotiation ──▶ redirect engine ──▶ 3xx / 401 / 503
//!                         │             │   ▲                │
//!                         │             ▼   │                ▼
//!                         │          registry (domains,   pass through
//!                         │          aliases, overrides)  + x-domain-id
//!                         │             ▲
//!     Admin Request ──────┴──▶ admin API┘   config watcher ──▶ state swap
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use domain_gateway::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use domain_gateway::lifecycle::{shutdown_signal, Shutdown};
use domain_gateway::observability::{logging, metrics};
use domain_gateway::{admin, HttpServer};

#[derive(Debug, Parser)]
#[command(name = "domain-gateway", version, about = "Multi-site domain negotiation gateway")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "domain-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        domains = config.domains.len(),
        aliases = config.aliases.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (config_updates, _watcher) = match cli.config {
        Some(ref path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let admin_listener = if config.admin.enabled {
        Some(TcpListener::bind(&config.admin.bind_address).await?)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;

    let admin_task = admin_listener.map(|listener| {
        let state = server.state();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        })
    });

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.trigger();
    });

    server.run(listener, config_updates, shutdown.subscribe()).await?;
    if let Some(task) = admin_task {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
