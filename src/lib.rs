//! App platform integration proof of concept.
//!
//! Two processes share this library:
//! - the status API (`integration-poc`), which probes PostgreSQL, Valkey,
//!   IAM Roles Anywhere and Secrets Manager on demand;
//! - the update worker (`worker`), which refreshes a shared last-update
//!   timestamp in all three stores every interval.

pub mod backends;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod worker;

pub use config::schema::AppConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use worker::{CycleRunner, WorkerLoop};
