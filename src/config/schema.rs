//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API and
//! the worker. All types derive Serde traits so a TOML file can provide a
//! base layer that the environment then overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration shared by the API server and the worker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// PostgreSQL connection settings.
    pub postgres: PostgresConfig,

    /// Valkey connection settings.
    pub valkey: ValkeyConfig,

    /// AWS region, secret name and Roles Anywhere material.
    pub aws: AwsConfig,

    /// Update worker timing.
    pub worker: WorkerConfig,

    /// HTTP API settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// PostgreSQL connection settings (the libpq `PG*` variables).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,

    /// libpq sslmode string (`disable`, `prefer`, `require`, ...).
    pub ssl_mode: String,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: "require".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Valkey (Redis protocol) connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValkeyConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,

    /// Connect over TLS (`rediss://`). Managed Valkey requires it.
    pub tls: bool,

    /// Verify the server certificate when `tls` is on.
    pub tls_verify: bool,

    /// Connect/command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ValkeyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            tls: true,
            tls_verify: false,
            timeout_secs: 10,
        }
    }
}

/// AWS settings and the IAM Roles Anywhere inputs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,

    /// Secrets Manager secret id read by the API and written by the worker.
    pub secret_name: String,

    /// Base64-encoded PEM client certificate.
    pub client_cert: Option<String>,

    /// Base64-encoded PEM private key.
    pub client_key: Option<String>,

    pub trust_anchor_arn: Option<String>,
    pub profile_arn: Option<String>,
    pub role_arn: Option<String>,

    /// Path to `aws_signing_helper`.
    pub signing_helper: String,

    /// Session name reported in the assumed-role ARN.
    pub session_name: String,

    /// Requested credential lifetime in seconds.
    pub session_duration_secs: u64,

    /// Deadline for one credential exchange.
    pub helper_timeout_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            secret_name: "poc-app-platform/test-secret".to_string(),
            client_cert: None,
            client_key: None,
            trust_anchor_arn: None,
            profile_arn: None,
            role_arn: None,
            signing_helper: "/usr/local/bin/aws_signing_helper".to_string(),
            session_name: "poc-app-session".to_string(),
            session_duration_secs: 3600,
            helper_timeout_secs: 30,
        }
    }
}

/// Update worker timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds between update cycles.
    pub interval_secs: u64,

    /// Granularity of shutdown checks while sleeping, in milliseconds.
    pub slice_millis: u64,

    /// Fixed delay after a failed cycle, in seconds.
    pub backoff_secs: u64,
}

impl WorkerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn slice(&self) -> Duration {
        Duration::from_millis(self.slice_millis)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            slice_millis: 1000,
            backoff_secs: 10,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Origins allowed by CORS. Empty means no cross-origin access.
    pub cors_origins: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Age after which a stored timestamp is reported as stale.
    pub stale_threshold_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout_secs: 60,
            stale_threshold_secs: 90,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Prometheus exporter address; metrics are off when unset.
    pub metrics_address: Option<String>,
}
