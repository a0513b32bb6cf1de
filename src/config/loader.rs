//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration: optional TOML file, then the real
/// process environment on top.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`. Unset or empty variables
/// leave the current value in place.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }

    // PostgreSQL
    if let Some(v) = get("PGHOST") {
        config.postgres.host = v;
    }
    if let Some(v) = get("PGPORT") {
        config.postgres.port = parse_var("PGPORT", v)?;
    }
    if let Some(v) = get("PGDATABASE") {
        config.postgres.database = v;
    }
    if let Some(v) = get("PGUSER") {
        config.postgres.user = v;
    }
    if let Some(v) = get("PGPASSWORD") {
        config.postgres.password = v;
    }
    if let Some(v) = get("PGSSLMODE") {
        config.postgres.ssl_mode = v;
    }

    // Valkey
    if let Some(v) = get("VALKEY_HOST") {
        config.valkey.host = v;
    }
    if let Some(v) = get("VALKEY_PORT") {
        config.valkey.port = parse_var("VALKEY_PORT", v)?;
    }
    if let Some(v) = get("VALKEY_PASSWORD") {
        config.valkey.password = Some(v);
    }
    if let Some(v) = get("VALKEY_TLS") {
        config.valkey.tls = parse_bool("VALKEY_TLS", v)?;
    }
    if let Some(v) = get("VALKEY_TLS_VERIFY") {
        config.valkey.tls_verify = parse_bool("VALKEY_TLS_VERIFY", v)?;
    }

    // AWS / Roles Anywhere
    if let Some(v) = get("AWS_REGION") {
        config.aws.region = v;
    }
    if let Some(v) = get("SECRETS_MANAGER_SECRET_NAME") {
        config.aws.secret_name = v;
    }
    if let Some(v) = get("IAM_CLIENT_CERT") {
        config.aws.client_cert = Some(v);
    }
    if let Some(v) = get("IAM_CLIENT_KEY") {
        config.aws.client_key = Some(v);
    }
    if let Some(v) = get("IAM_TRUST_ANCHOR_ARN") {
        config.aws.trust_anchor_arn = Some(v);
    }
    if let Some(v) = get("IAM_PROFILE_ARN") {
        config.aws.profile_arn = Some(v);
    }
    if let Some(v) = get("IAM_ROLE_ARN") {
        config.aws.role_arn = Some(v);
    }
    if let Some(v) = get("IAM_SIGNING_HELPER") {
        config.aws.signing_helper = v;
    }

    // Worker
    if let Some(v) = get("WORKER_INTERVAL_SECS") {
        config.worker.interval_secs = parse_var("WORKER_INTERVAL_SECS", v)?;
    }
    if let Some(v) = get("WORKER_SLICE_MILLIS") {
        config.worker.slice_millis = parse_var("WORKER_SLICE_MILLIS", v)?;
    }
    if let Some(v) = get("WORKER_BACKOFF_SECS") {
        config.worker.backoff_secs = parse_var("WORKER_BACKOFF_SECS", v)?;
    }

    // HTTP
    if let Some(v) = get("API_CORS_ORIGINS") {
        config.http.cors_origins = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    // Observability
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = match v.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::InvalidVar {
                    var: "LOG_FORMAT",
                    value: v,
                })
            }
        };
    }
    if let Some(v) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(v);
    }

    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { var, value })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar { var, value }),
    }
}
