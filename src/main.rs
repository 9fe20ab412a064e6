//! Edge proxy for a single upstream REST API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ request id ──▶ access log ──▶ CORS ──▶ rate limit
//!                                                          │
//!                                                          ▼
//!                              ┌──────────────────────────────────────┐
//!                              │ pipeline: method ▶ body size ▶       │
//!                              │           content type ▶ path        │
//!                              └──────────────────┬───────────────────┘
//!                                                 │  (upstream deadline)
//!                                                 ▼
//!                              cache (GET) ──miss──▶ upstream client ──▶ Upstream API
//!                                                      credential injected
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use edge_proxy::config::{default_config, load_config};
use edge_proxy::lifecycle::signals::forward_signals;
use edge_proxy::observability::init_logging;
use edge_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "Credential-injecting edge proxy for a single upstream API", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults are used when absent.
    #[arg(short, long, env = "EDGE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "edge-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        mount_path = %config.proxy.mount_path,
        cache_enabled = config.cache.enabled,
        rate_limit_enabled = config.rate_limit.enabled,
        upstream_timeout_ms = config.timeouts.upstream_ms,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    if args.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    // Bind last so traffic only arrives once everything is built.
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        forward_signals(&shutdown).await;
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
