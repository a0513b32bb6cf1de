//! Update worker: refreshes the shared last-update timestamp in PostgreSQL,
//! Valkey and Secrets Manager every interval until SIGINT/SIGTERM.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use integration_poc::backends::PostgresBackend;
use integration_poc::config::load_config;
use integration_poc::lifecycle::{prepare_schema, spawn_signal_listener, SchemaPolicy, Shutdown};
use integration_poc::observability::{logging, metrics};
use integration_poc::worker::{CycleHealth, CycleRunner, LoopTiming, WorkerLoop};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Periodic timestamp updates across PostgreSQL, Valkey and Secrets Manager", long_about = None)]
struct Args {
    /// Optional TOML file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit (status 0 only if every backend updated).
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Worker initialization failed");
            eprintln!("worker: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    logging::init_logging(config.observability.log_format);

    tracing::info!(
        interval_secs = config.worker.interval_secs,
        slice_millis = config.worker.slice_millis,
        backoff_secs = config.worker.backoff_secs,
        "Worker service starting"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    prepare_schema(
        &PostgresBackend::new(config.postgres.clone()),
        SchemaPolicy::Required,
    )
    .await?;

    let runner = CycleRunner::from_config(&config);

    if args.once {
        let summary = runner.run_cycle(1).await?;
        return Ok(if once_succeeded(summary.health()) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    let report = WorkerLoop::new(runner, LoopTiming::from(&config.worker))
        .run(shutdown.subscribe())
        .await;

    tracing::info!(
        cycles = report.cycles,
        failed_cycles = report.failed_cycles,
        "Worker service stopped"
    );
    Ok(ExitCode::SUCCESS)
}

/// `--once` exits zero only when every backend was updated.
fn once_succeeded(health: CycleHealth) -> bool {
    health == CycleHealth::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_requires_every_backend() {
        assert!(once_succeeded(CycleHealth::Healthy));
        assert!(!once_succeeded(CycleHealth::Degraded));
        assert!(!once_succeeded(CycleHealth::Down));
    }

    #[test]
    fn test_once_flag_parses() {
        let args = Args::try_parse_from(["worker", "--once"]).unwrap();
        assert!(args.once);
        assert!(args.config.is_none());
    }
}
