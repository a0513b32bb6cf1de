//! The worker's main loop.
//!
//! # States
//! ```text
//! Running → Running:  cycle finished, interval slept
//! Running → Running:  cycle errored, fixed back-off slept
//! Running → Stopping: shutdown observed between cycles or between sleep slices
//! Stopping → Stopped: loop returns its report
//! ```
//!
//! # Design Decisions
//! - Sleeps are cut into slices; shutdown is polled between slices, so the
//!   loop stops at most one slice after the signal
//! - Shutdown is never injected into an in-flight cycle
//! - A failed cycle never ends the loop

use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::config::WorkerConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::worker::cycle::Cycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// What the loop did before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    /// Cycles started, including failed ones.
    pub cycles: u64,
    /// Cycles whose runner returned an error.
    pub failed_cycles: u64,
    pub state: LoopState,
}

/// Timing of the loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    pub interval: Duration,
    pub slice: Duration,
    pub backoff: Duration,
}

impl From<&WorkerConfig> for LoopTiming {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            interval: config.interval(),
            slice: config.slice(),
            backoff: config.backoff(),
        }
    }
}

pub struct WorkerLoop<C> {
    cycle: C,
    timing: LoopTiming,
}

impl<C: Cycle> WorkerLoop<C> {
    pub fn new(cycle: C, timing: LoopTiming) -> Self {
        Self { cycle, timing }
    }

    pub async fn run(&self, shutdown: ShutdownSignal) -> LoopReport {
        tracing::info!(
            interval_secs = self.timing.interval.as_secs_f64(),
            "Worker loop starting"
        );

        let mut state = LoopState::Running;
        let mut cycles = 0u64;
        let mut failed_cycles = 0u64;

        while state == LoopState::Running {
            if shutdown.is_shutdown() {
                state = LoopState::Stopping;
                break;
            }

            cycles += 1;
            let pause = match self.cycle.run(cycles).await {
                Ok(summary) => {
                    tracing::info!(
                        cycle = cycles,
                        successes = summary.success_count(),
                        total = summary.total(),
                        next_in_secs = self.timing.interval.as_secs_f64(),
                        "Waiting for next cycle"
                    );
                    self.timing.interval
                }
                Err(e) => {
                    failed_cycles += 1;
                    metrics::record_cycle_failure();
                    tracing::error!(
                        cycle = cycles,
                        error = %e,
                        backoff_secs = self.timing.backoff.as_secs_f64(),
                        "Unexpected error in worker loop, backing off"
                    );
                    self.timing.backoff
                }
            };

            if !sleep_sliced(pause, self.timing.slice, &shutdown).await {
                tracing::info!(cycle = cycles, "Shutdown signal received during wait period");
                state = LoopState::Stopping;
            }
        }

        debug_assert_eq!(state, LoopState::Stopping);
        tracing::info!(cycles, failed_cycles, "Worker loop stopped");
        LoopReport {
            cycles,
            failed_cycles,
            state: LoopState::Stopped,
        }
    }
}

/// Shortest step `sleep_sliced` takes, whatever slice it is handed.
pub const MIN_SLICE: Duration = Duration::from_millis(1);

/// Sleep `total` in steps of at most `slice`. Returns `false` if shutdown was
/// observed before the full duration elapsed.
pub async fn sleep_sliced(total: Duration, slice: Duration, shutdown: &ShutdownSignal) -> bool {
    let slice = slice.max(MIN_SLICE);
    let deadline = Instant::now() + total;
    loop {
        if shutdown.is_shutdown() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        sleep(slice.min(deadline - now)).await;
    }
}
