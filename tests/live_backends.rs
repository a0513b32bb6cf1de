//! End-to-end checks against real backends.
//!
//! Ignored by default. Export the same variables the deployed services use
//! (`PG*`, `VALKEY_*`, `IAM_*`, `AWS_REGION`) and run with `--ignored`.

use chrono::{DateTime, Utc};

use integration_poc::backends::{PostgresBackend, SecretsStore, ValkeyBackend};
use integration_poc::config::load_config;
use integration_poc::worker::{CycleHealth, CycleRunner};

fn parse(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts)
        .unwrap_or_else(|e| panic!("bad timestamp {ts:?}: {e}"))
        .with_timezone(&Utc)
}

#[tokio::test]
#[ignore = "requires live PostgreSQL, Valkey and AWS credentials"]
async fn test_cycle_writes_consistent_timestamps() {
    let config = load_config(None).unwrap();
    let postgres = PostgresBackend::new(config.postgres.clone());
    postgres.ensure_schema().await.unwrap();

    let summary = CycleRunner::from_config(&config).run_cycle(1).await.unwrap();
    assert_eq!(summary.health(), CycleHealth::Healthy, "{summary:?}");

    let pg_ts = postgres.read_last_update().await.unwrap().unwrap();
    let valkey_ts = ValkeyBackend::new(config.valkey.clone())
        .get_last_update()
        .await
        .unwrap()
        .unwrap();
    let secret_ts = SecretsStore::new(config.aws.clone())
        .read()
        .await
        .unwrap()
        .updated_at()
        .unwrap();

    let tolerance = chrono::Duration::seconds(2);
    for ts in [pg_ts, parse(&valkey_ts), parse(&secret_ts)] {
        assert!(
            (ts - summary.started_at).abs() <= tolerance,
            "{ts} vs cycle start {}",
            summary.started_at
        );
    }
}

#[tokio::test]
#[ignore = "requires live PostgreSQL and Valkey"]
async fn test_database_probes_succeed() {
    let config = load_config(None).unwrap();

    let pg = PostgresBackend::new(config.postgres.clone()).probe().await;
    assert!(pg.connected && pg.writable && pg.readable, "{pg:?}");

    let valkey = ValkeyBackend::new(config.valkey.clone()).probe().await;
    assert!(valkey.connected && valkey.ping_ok && valkey.set_get_ok, "{valkey:?}");
}
