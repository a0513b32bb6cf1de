//! Backend error definitions.

use thiserror::Error;

/// Errors that can occur while talking to an external backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// PostgreSQL connection or query failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Valkey connection or command failed.
    #[error("Valkey error: {0}")]
    Valkey(#[from] redis::RedisError),

    /// An AWS API call failed.
    #[error("AWS error: {0}")]
    Aws(String),

    /// The Roles Anywhere credential exchange failed.
    #[error("Credential exchange failed: {0}")]
    Credentials(String),

    /// Required configuration is absent.
    #[error("Missing configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    /// The backend did not answer in time.
    #[error("{backend} timed out after {secs} seconds")]
    Timeout { backend: &'static str, secs: u64 },
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
