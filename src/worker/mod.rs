//! Timestamp update worker.
//!
//! # Data Flow
//! ```text
//! main_loop.rs (every interval, until shutdown)
//!     → cycle.rs (stamp once, spawn one task per updater, join)
//!         → updater.rs (PostgreSQL upsert | Valkey SET | secret update)
//!     → outcome.rs (UpdateOutcome per backend → CycleSummary)
//! ```
//!
//! # Design Decisions
//! - Backend failures are data (`UpdateOutcome::Failure`), never errors
//! - Only a failure of the cycle itself reaches the loop, which backs off
//! - Schema setup happens before the loop and is the only fatal step

pub mod cycle;
pub mod main_loop;
pub mod outcome;
pub mod updater;

pub use cycle::{Cycle, CycleRunner, WorkerError};
pub use main_loop::{LoopReport, LoopState, LoopTiming, WorkerLoop};
pub use outcome::{CycleHealth, CycleSummary, OperationReport, UpdateOutcome};
pub use updater::TimestampUpdater;
