//! HTTP reverse-proxy load balancer.
//!
//! Accepts inbound requests, picks a backend with the configured strategy,
//! forwards the request over a pooled transport, and reports the result.
//! A background monitor keeps backend health flags current.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use url::Url;

use load_balancer::balancer::{self, backend::Backend};
use load_balancer::config::loader::load_config;
use load_balancer::health::HealthMonitor;
use load_balancer::http::HttpServer;
use load_balancer::lifecycle::{signals, Shutdown};
use load_balancer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "load-balancer")]
#[command(about = "HTTP reverse-proxy load balancer", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = args
        .config
        .or_else(|| std::env::var_os("CONFIG_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("configs/config.toml"));

    let config = load_config(&config_path)?;

    logging::init(config.env);
    tracing::info!(
        env = ?config.env,
        algorithm = ?config.algorithm,
        backends = config.backends.len(),
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    // One record per configured backend, shared by the strategy and the
    // health monitor.
    let mut backends = Vec::with_capacity(config.backends.len());
    for entry in &config.backends {
        let address = Url::parse(&entry.address)?;
        backends.push(Arc::new(Backend::new(address, entry.health_path.clone())));
    }

    let balancer = balancer::for_algorithm(config.algorithm, backends.clone());

    let shutdown = Shutdown::new();

    let monitor = HealthMonitor::new(
        backends,
        Duration::from_secs(config.health_check.interval_secs),
        Duration::from_secs(config.health_check.timeout_secs),
    );
    let monitor_handle = tokio::spawn(monitor.run(shutdown.subscribe()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    let server = HttpServer::new(&config, balancer);
    let server_handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::shutdown_signal().await;
    tracing::info!("shutting down gracefully");
    shutdown.trigger();

    let drain = Duration::from_secs(config.shutdown.timeout_secs);
    match tokio::time::timeout(drain, server_handle).await {
        Ok(Ok(Ok(()))) => tracing::info!("HTTP server gracefully stopped"),
        Ok(Ok(Err(error))) => tracing::error!(%error, "HTTP server error during shutdown"),
        Ok(Err(error)) => tracing::error!(%error, "HTTP server task failed"),
        Err(_) => tracing::warn!(timeout = ?drain, "shutdown timeout elapsed before drain finished"),
    }

    if let Err(error) = monitor_handle.await {
        tracing::error!(%error, "health monitor task failed");
    }

    tracing::info!("application stopped");
    Ok(())
}
