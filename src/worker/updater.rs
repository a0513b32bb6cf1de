//! The update operations run in each cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backends::{BackendResult, PostgresBackend, SecretsStore, ValkeyBackend};

pub const POSTGRES: &str = "PostgreSQL";
pub const VALKEY: &str = "Valkey";
pub const SECRETS_MANAGER: &str = "AWS Secrets Manager";

/// One backend that stores the shared last-update timestamp.
#[async_trait]
pub trait TimestampUpdater: Send + Sync {
    /// Display name used in logs, metrics and the cycle summary.
    fn name(&self) -> &'static str;

    /// Write `at` to the backend.
    async fn update(&self, at: DateTime<Utc>) -> BackendResult<()>;
}

#[async_trait]
impl TimestampUpdater for PostgresBackend {
    fn name(&self) -> &'static str {
        POSTGRES
    }

    async fn update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        self.upsert_last_update(at).await
    }
}

#[async_trait]
impl TimestampUpdater for ValkeyBackend {
    fn name(&self) -> &'static str {
        VALKEY
    }

    async fn update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        self.set_last_update(at).await
    }
}

#[async_trait]
impl TimestampUpdater for SecretsStore {
    fn name(&self) -> &'static str {
        SECRETS_MANAGER
    }

    async fn update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        self.write_timestamp(at).await
    }
}
