//! One update cycle: fan out to every updater, join, summarize.
//!
//! # Responsibilities
//! - Stamp the cycle once and hand the same timestamp to every backend
//! - Run the updaters concurrently, each in its own task
//! - Fold returned errors and panics into the same `Failure` outcome
//! - Log the per-backend results and one summary line
//!
//! # Design Decisions
//! - No retry inside a cycle; the next cycle is the retry
//! - All tasks are joined before returning, so cycles never overlap

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use crate::backends::{PostgresBackend, SecretsStore, ValkeyBackend};
use crate::config::AppConfig;
use crate::observability::metrics;
use crate::worker::outcome::{CycleHealth, CycleSummary, OperationReport, UpdateOutcome};
use crate::worker::updater::TimestampUpdater;

/// Errors raised by a cycle as a whole, as opposed to a single backend.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("no updaters configured")]
    NoUpdaters,

    #[error("cycle failed: {0}")]
    Cycle(String),
}

/// Something the main loop can run once per interval.
#[async_trait]
pub trait Cycle: Send + Sync {
    async fn run(&self, cycle: u64) -> Result<CycleSummary, WorkerError>;
}

/// Runs the configured updaters concurrently.
#[derive(Clone)]
pub struct CycleRunner {
    updaters: Vec<Arc<dyn TimestampUpdater>>,
}

impl CycleRunner {
    pub fn new(updaters: Vec<Arc<dyn TimestampUpdater>>) -> Self {
        Self { updaters }
    }

    /// Runner over the three real backends.
    pub fn from_config(config: &AppConfig) -> Self {
        let updaters: Vec<Arc<dyn TimestampUpdater>> = vec![
            Arc::new(PostgresBackend::new(config.postgres.clone())),
            Arc::new(ValkeyBackend::new(config.valkey.clone())),
            Arc::new(
                SecretsStore::new(config.aws.clone())
                    .with_cycle_interval(config.worker.interval_secs),
            ),
        ];
        Self::new(updaters)
    }

    pub fn backends(&self) -> Vec<&'static str> {
        self.updaters.iter().map(|u| u.name()).collect()
    }

    pub async fn run_cycle(&self, cycle: u64) -> Result<CycleSummary, WorkerError> {
        if self.updaters.is_empty() {
            return Err(WorkerError::NoUpdaters);
        }

        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(cycle, backends = ?self.backends(), "Starting update cycle");

        let handles = self.updaters.iter().map(|updater| {
            let updater = Arc::clone(updater);
            tokio::spawn(async move { updater.update(started_at).await })
        });
        let results = join_all(handles).await;

        let reports: Vec<OperationReport> = self
            .updaters
            .iter()
            .zip(results)
            .map(|(updater, joined)| {
                let backend = updater.name();
                let outcome = match joined {
                    Ok(Ok(())) => {
                        tracing::info!(cycle, backend, "Update completed successfully");
                        UpdateOutcome::Success {
                            timestamp: started_at,
                        }
                    }
                    Ok(Err(e)) => {
                        tracing::error!(cycle, backend, error = %e, "Update failed");
                        UpdateOutcome::Failure {
                            reason: e.to_string(),
                        }
                    }
                    Err(e) => {
                        tracing::error!(cycle, backend, error = %e, "Update task aborted");
                        UpdateOutcome::Failure {
                            reason: e.to_string(),
                        }
                    }
                };
                metrics::record_backend_update(backend, outcome.is_success());
                OperationReport { backend, outcome }
            })
            .collect();

        let summary = CycleSummary {
            cycle,
            started_at,
            duration: clock.elapsed(),
            reports,
        };
        log_summary(&summary);
        metrics::record_cycle(summary.duration, summary.success_count(), summary.total());

        Ok(summary)
    }
}

#[async_trait]
impl Cycle for CycleRunner {
    async fn run(&self, cycle: u64) -> Result<CycleSummary, WorkerError> {
        self.run_cycle(cycle).await
    }
}

fn log_summary(summary: &CycleSummary) {
    let successes = summary.success_count();
    let total = summary.total();
    let duration_secs = summary.duration.as_secs_f64();

    match summary.health() {
        CycleHealth::Healthy => tracing::info!(
            cycle = summary.cycle,
            successes,
            total,
            duration_secs,
            "Update cycle completed: all backends updated"
        ),
        CycleHealth::Degraded => tracing::warn!(
            cycle = summary.cycle,
            successes,
            total,
            failed = total - successes,
            duration_secs,
            "Update cycle completed with partial success"
        ),
        CycleHealth::Down => tracing::error!(
            cycle = summary.cycle,
            successes,
            total,
            duration_secs,
            "Update cycle completed: every backend failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BackendError, BackendResult};
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        fail: bool,
        seen: Mutex<Vec<DateTime<Utc>>>,
    }

    impl Recording {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TimestampUpdater for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn update(&self, at: DateTime<Utc>) -> BackendResult<()> {
            self.seen.lock().unwrap().push(at);
            if self.fail {
                Err(BackendError::Aws("simulated".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_every_updater_gets_the_cycle_timestamp() {
        let a = Recording::new("a", false);
        let b = Recording::new("b", true);
        let runner = CycleRunner::new(vec![
            a.clone() as Arc<dyn TimestampUpdater>,
            b.clone() as Arc<dyn TimestampUpdater>,
        ]);

        let summary = runner.run_cycle(7).await.unwrap();
        assert_eq!(summary.cycle, 7);
        assert_eq!(summary.backends_in_order(), vec!["a", "b"]);
        assert_eq!(a.seen.lock().unwrap().as_slice(), &[summary.started_at]);
        assert_eq!(b.seen.lock().unwrap().as_slice(), &[summary.started_at]);
        assert_eq!(
            summary.outcome("a"),
            Some(&UpdateOutcome::Success {
                timestamp: summary.started_at
            })
        );
        assert_eq!(summary.success_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_runner_errors() {
        let runner = CycleRunner::new(Vec::new());
        assert!(matches!(runner.run_cycle(1).await, Err(WorkerError::NoUpdaters)));
    }

    #[test]
    fn test_real_backend_order() {
        let runner = CycleRunner::from_config(&AppConfig::default());
        assert_eq!(
            runner.backends(),
            vec!["PostgreSQL", "Valkey", "AWS Secrets Manager"]
        );
    }

    impl CycleSummary {
        fn backends_in_order(&self) -> Vec<&'static str> {
            self.reports.iter().map(|r| r.backend).collect()
        }
    }
}
