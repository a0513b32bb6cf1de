//! Per-operation and per-cycle results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Outcome of one backend update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Success { timestamp: DateTime<Utc> },
    Failure { reason: String },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success { .. })
    }
}

/// One backend's line in the cycle summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub backend: &'static str,
    pub outcome: UpdateOutcome,
}

/// Aggregate verdict of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleHealth {
    /// Every backend was updated.
    Healthy,
    /// Some backends failed.
    Degraded,
    /// No backend was updated.
    Down,
}

/// Summary emitted once per cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub reports: Vec<OperationReport>,
}

impl CycleSummary {
    pub fn success_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn health(&self) -> CycleHealth {
        match self.success_count() {
            n if n == self.total() && n > 0 => CycleHealth::Healthy,
            0 => CycleHealth::Down,
            _ => CycleHealth::Degraded,
        }
    }

    /// Outcome reported for `backend`, if it took part in the cycle.
    pub fn outcome(&self, backend: &str) -> Option<&UpdateOutcome> {
        self.reports
            .iter()
            .find(|r| r.backend == backend)
            .map(|r| &r.outcome)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcomes: Vec<UpdateOutcome>) -> CycleSummary {
        let names = ["PostgreSQL", "Valkey", "AWS Secrets Manager"];
        CycleSummary {
            cycle: 1,
            started_at: Utc::now(),
            duration: Duration::from_millis(250),
            reports: outcomes
                .into_iter()
                .zip(names)
                .map(|(outcome, backend)| OperationReport { backend, outcome })
                .collect(),
        }
    }

    fn ok() -> UpdateOutcome {
        UpdateOutcome::Success {
            timestamp: Utc::now(),
        }
    }

    fn failed() -> UpdateOutcome {
        UpdateOutcome::Failure {
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn test_health_verdicts() {
        assert_eq!(summary(vec![ok(), ok(), ok()]).health(), CycleHealth::Healthy);
        assert_eq!(summary(vec![ok(), failed(), ok()]).health(), CycleHealth::Degraded);
        assert_eq!(summary(vec![failed(), failed(), failed()]).health(), CycleHealth::Down);
        assert_eq!(summary(vec![]).health(), CycleHealth::Down);
    }

    #[test]
    fn test_outcome_lookup() {
        let s = summary(vec![ok(), failed(), ok()]);
        assert_eq!(s.success_count(), 2);
        assert!(matches!(
            s.outcome("Valkey"),
            Some(UpdateOutcome::Failure { reason }) if reason == "connection refused"
        ));
        assert!(s.outcome("Kafka").is_none());
    }

    #[test]
    fn test_serialized_form() {
        let s = summary(vec![failed()]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["duration"], 0.25);
        assert_eq!(json["reports"][0]["outcome"]["status"], "failure");
        assert_eq!(json["reports"][0]["outcome"]["reason"], "connection refused");
    }
}
