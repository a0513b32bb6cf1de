//! Metrics collection and exposition.
//!
//! # Metrics
//! - `worker_cycles_total` (counter): update cycles attempted
//! - `worker_cycle_failures_total` (counter): cycles that errored before producing a summary
//! - `worker_backend_updates_total` (counter): per-backend outcomes by `backend`, `outcome`
//! - `worker_cycle_duration_seconds` (histogram): wall time of one cycle
//! - `worker_cycle_success_ratio` (gauge): successful backends / total in the last cycle
//! - `api_probe_total` (counter): status probes by `backend`, `outcome`
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Exporter is optional and bound to its own address

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub fn record_backend_update(backend: &'static str, success: bool) {
    counter!(
        "worker_backend_updates_total",
        "backend" => backend,
        "outcome" => outcome_label(success)
    )
    .increment(1);
}

pub fn record_cycle(duration: Duration, successes: usize, total: usize) {
    counter!("worker_cycles_total").increment(1);
    histogram!("worker_cycle_duration_seconds").record(duration.as_secs_f64());
    if total > 0 {
        gauge!("worker_cycle_success_ratio").set(successes as f64 / total as f64);
    }
}

pub fn record_cycle_failure() {
    counter!("worker_cycles_total").increment(1);
    counter!("worker_cycle_failures_total").increment(1);
}

pub fn record_probe(backend: &'static str, success: bool) {
    counter!(
        "api_probe_total",
        "backend" => backend,
        "outcome" => outcome_label(success)
    )
    .increment(1);
}
