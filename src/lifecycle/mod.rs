//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Verify schema → Start server / worker loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → API stops accepting / worker leaves its sleep → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then schema, then traffic
//! - One shutdown token per process, handed to every long-running task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::spawn_signal_listener;
pub use startup::{prepare_schema, SchemaPolicy};
