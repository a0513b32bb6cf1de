//! Startup orchestration.
//!
//! # Responsibilities
//! - Prepare the database before traffic or cycles start
//!
//! # Design Decisions
//! - The worker fails fast: no schema, no loop
//! - The API degrades: it starts anyway and its probes report the problem

use crate::backends::{BackendResult, PostgresBackend};

/// How a schema failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Return the error; the caller exits.
    Required,
    /// Log the error and carry on.
    BestEffort,
}

pub async fn prepare_schema(db: &PostgresBackend, policy: SchemaPolicy) -> BackendResult<()> {
    tracing::info!(host = %db.host(), "Verifying PostgreSQL schema");
    match db.ensure_schema().await {
        Ok(()) => Ok(()),
        Err(e) if policy == SchemaPolicy::BestEffort => {
            tracing::error!(
                error = %e,
                "Database initialization failed; status endpoints will report it"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to ensure PostgreSQL schema");
            Err(e)
        }
    }
}
