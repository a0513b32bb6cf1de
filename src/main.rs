//! Status API for the integration proof of concept.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!   GET /db/status    │  http::server ──▶ http::handlers              │
//!   GET /iam/status ──┼─▶     │                 │                      │──▶ PostgreSQL
//!   GET /secret/...   │       │                 ├─▶ backends::postgres │──▶ Valkey
//!   GET /worker/...   │       │                 ├─▶ backends::valkey   │──▶ STS / Secrets Manager
//!                     │       │                 └─▶ backends::secrets  │
//!                     │  lifecycle (signals → graceful shutdown)       │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use integration_poc::backends::PostgresBackend;
use integration_poc::config::load_config;
use integration_poc::http::ApiServer;
use integration_poc::lifecycle::{prepare_schema, spawn_signal_listener, SchemaPolicy, Shutdown};
use integration_poc::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "integration-poc")]
#[command(about = "Connectivity status API for PostgreSQL, Valkey and AWS", long_about = None)]
struct Args {
    /// Optional TOML file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(config.observability.log_format);
    tracing::info!("integration-poc v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        postgres_host = %config.postgres.host,
        valkey_host = %config.valkey.host,
        region = %config.aws.region,
        cors_origins = ?config.http.cors_origins,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    // The API still starts without a database; the probes report the failure.
    prepare_schema(
        &PostgresBackend::new(config.postgres.clone()),
        SchemaPolicy::BestEffort,
    )
    .await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    let server = ApiServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
