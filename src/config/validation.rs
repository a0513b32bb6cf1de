//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Check the bind address parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Missing IAM material is NOT an error here; only the AWS operations fail

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }

    if config.worker.interval_secs == 0 {
        errors.push(ValidationError::new("worker.interval_secs", "interval must be > 0"));
    }
    if config.worker.slice_millis == 0 {
        errors.push(ValidationError::new("worker.slice_millis", "slice must be > 0"));
    } else if config.worker.interval_secs > 0
        && config.worker.slice_millis > config.worker.interval_secs.saturating_mul(1000)
    {
        errors.push(ValidationError::new(
            "worker.slice_millis",
            "slice must not exceed the interval",
        ));
    }

    if config.postgres.port == 0 {
        errors.push(ValidationError::new("postgres.port", "port must be > 0"));
    }
    if config.valkey.port == 0 {
        errors.push(ValidationError::new("valkey.port", "port must be > 0"));
    }
    if config.aws.region.trim().is_empty() {
        errors.push(ValidationError::new("aws.region", "region must not be empty"));
    }
    if config.aws.helper_timeout_secs == 0 {
        errors.push(ValidationError::new("aws.helper_timeout_secs", "timeout must be > 0"));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("not a socket address: {addr:?}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
