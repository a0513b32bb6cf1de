//! External backend clients.
//!
//! # Data Flow
//! ```text
//! worker updaters / API handlers
//!     → postgres.rs (last_update upsert, test_data probe)
//!     → valkey.rs   (worker:last_update key, poc-test probe)
//!     → secrets.rs  (JSON secret get/update)
//!           → identity.rs (Roles Anywhere credential exchange)
//! ```
//!
//! # Design Decisions
//! - Every call opens and closes its own connection
//! - Errors are typed (error.rs); callers decide whether they are fatal
//! - Status probes never fail: they return a status struct with `error` set

pub mod error;
pub mod identity;
pub mod postgres;
pub mod secrets;
pub mod valkey;

pub use error::{BackendError, BackendResult};
pub use identity::{IamStatus, RolesAnywhere};
pub use postgres::{PostgresBackend, PostgresStatus};
pub use secrets::{SecretStatus, SecretsStore};
pub use valkey::{ValkeyBackend, ValkeyStatus};

/// Source key of the worker's row in `last_update`.
pub const WORKER_SOURCE: &str = "worker";
