//! Response bodies and the staleness math behind `/worker/status`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backends::{PostgresStatus, SecretStatus, ValkeyStatus};

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DbStatus {
    pub postgres: PostgresStatus,
    pub valkey: ValkeyStatus,
}

/// Freshness of one stored timestamp.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimestampStatus {
    pub last_update: Option<String>,
    pub age_seconds: Option<f64>,
    pub is_stale: bool,
    pub status: &'static str,
}

impl TimestampStatus {
    pub fn new(last_update: Option<String>, reachable: bool, now: DateTime<Utc>, stale_after_secs: u64) -> Self {
        let age_seconds = last_update.as_deref().and_then(|ts| age_seconds(ts, now));
        Self {
            is_stale: age_seconds.map_or(true, |age| age > stale_after_secs as f64),
            last_update,
            age_seconds,
            status: if reachable { "ok" } else { "error" },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Timestamps {
    pub postgres: TimestampStatus,
    pub valkey: TimestampStatus,
    pub secrets_manager: TimestampStatus,
}

#[derive(Debug, Serialize)]
pub struct WorkerStatus {
    pub current_time: String,
    pub stale_threshold_seconds: u64,
    pub timestamps: Timestamps,
    pub overall_status: &'static str,
}

impl WorkerStatus {
    pub fn from_probes(
        db: &DbStatus,
        secret: &SecretStatus,
        now: DateTime<Utc>,
        stale_after_secs: u64,
    ) -> Self {
        let all_ok = db.postgres.connected && db.valkey.connected && secret.ok;
        Self {
            current_time: now.to_rfc3339(),
            stale_threshold_seconds: stale_after_secs,
            timestamps: Timestamps {
                postgres: TimestampStatus::new(
                    db.postgres.postgres_last_update.clone(),
                    db.postgres.connected,
                    now,
                    stale_after_secs,
                ),
                valkey: TimestampStatus::new(
                    db.valkey.valkey_last_update.clone(),
                    db.valkey.connected,
                    now,
                    stale_after_secs,
                ),
                secrets_manager: TimestampStatus::new(
                    secret.secret_last_update.clone(),
                    secret.ok,
                    now,
                    stale_after_secs,
                ),
            },
            overall_status: if all_ok { "ok" } else { "error" },
        }
    }
}

/// Seconds between an RFC 3339 timestamp and `now`; `None` if unparseable.
pub fn age_seconds(timestamp: &str, now: DateTime<Utc>) -> Option<f64> {
    let then = DateTime::parse_from_rfc3339(timestamp).ok()?;
    let age = now.signed_duration_since(then.with_timezone(&Utc));
    Some(age.num_milliseconds() as f64 / 1000.0)
}
