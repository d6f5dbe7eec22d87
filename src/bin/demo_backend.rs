//! Demo upstream server for manual testing.
//!
//! Serves a greeting on `/`, a probe target on `/health`, and an
//! artificially slow endpoint on `/sleep?delay=N`.

use std::time::Duration;

use axum::{
    extract::Query,
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Demo upstream for the load balancer", long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 9001)]
    port: u16,
}

#[derive(Deserialize)]
struct SleepParams {
    delay: u64,
}

async fn root() -> &'static str {
    "Hello"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn sleep(Query(params): Query<SleepParams>) -> String {
    tracing::info!(seconds = params.delay, "sleeping");
    tokio::time::sleep(Duration::from_secs(params.delay)).await;
    format!("Slept for {} seconds", params.delay)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/sleep", get(sleep));

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "server is running");
    axum::serve(listener, app).await?;
    Ok(())
}
