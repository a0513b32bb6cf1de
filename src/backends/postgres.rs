//! PostgreSQL client.
//!
//! # Responsibilities
//! - Open one connection per call from the `PG*` settings
//! - Create the `test_data` and `last_update` tables
//! - Upsert the worker's timestamp row
//! - Run the write/read/delete connectivity probe
//!
//! # Design Decisions
//! - No pool: each operation connects, works, and closes
//! - Connect and every query section are bounded by `connect_timeout_secs`

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::types::Json;
use sqlx::{ConnectOptions, Connection};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;

use crate::backends::error::{BackendError, BackendResult};
use crate::backends::WORKER_SOURCE;
use crate::config::PostgresConfig;

const CREATE_TEST_DATA: &str =
    "CREATE TABLE IF NOT EXISTS test_data (id SERIAL PRIMARY KEY, message TEXT NOT NULL)";

const CREATE_LAST_UPDATE: &str = r#"
    CREATE TABLE IF NOT EXISTS last_update (
        source VARCHAR(50) PRIMARY KEY,
        timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
        metadata JSONB
    )
"#;

const UPSERT_LAST_UPDATE: &str = r#"
    INSERT INTO last_update (source, timestamp, metadata)
    VALUES ($1, $2, $3)
    ON CONFLICT (source)
    DO UPDATE SET
        timestamp = EXCLUDED.timestamp,
        metadata = EXCLUDED.metadata
"#;

const PROBE_MESSAGE: &str = "hello";

/// Result of the `/db/status` PostgreSQL probe.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostgresStatus {
    pub connected: bool,
    pub writable: bool,
    pub readable: bool,
    pub host: String,
    pub postgres_last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// PostgreSQL backend handle. Holds settings only, never a live connection.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    config: PostgresConfig,
}

impl PostgresBackend {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn connect_options(&self) -> BackendResult<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.config.ssl_mode)?;
        Ok(PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .password(&self.config.password)
            .ssl_mode(ssl_mode))
    }

    async fn bounded<T, F>(&self, fut: F) -> BackendResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        let secs = self.config.connect_timeout_secs;
        match timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                backend: "postgres",
                secs,
            }),
        }
    }

    async fn connect(&self) -> BackendResult<PgConnection> {
        let options = self.connect_options()?;
        self.bounded(async { Ok(options.connect().await?) }).await
    }

    /// Create both tables if they do not exist.
    pub async fn ensure_schema(&self) -> BackendResult<()> {
        let mut conn = self.connect().await?;
        self.bounded(async {
            let mut tx = conn.begin().await?;
            sqlx::query(CREATE_TEST_DATA).execute(&mut *tx).await?;
            sqlx::query(CREATE_LAST_UPDATE).execute(&mut *tx).await?;
            tx.commit().await?;
            Ok(conn.close().await?)
        })
        .await?;
        tracing::info!(host = %self.config.host, "PostgreSQL schema verified");
        Ok(())
    }

    /// Upsert the worker's row in `last_update`.
    pub async fn upsert_last_update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        let metadata = serde_json::json!({
            "updated_by": "worker_service",
            "cycle": "automated",
        });

        let mut conn = self.connect().await?;
        self.bounded(async {
            let mut tx = conn.begin().await?;
            sqlx::query(UPSERT_LAST_UPDATE)
                .bind(WORKER_SOURCE)
                .bind(at)
                .bind(Json(metadata))
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(conn.close().await?)
        })
        .await
    }

    /// Read the worker's timestamp; `None` when the worker never ran.
    pub async fn read_last_update(&self) -> BackendResult<Option<DateTime<Utc>>> {
        let mut conn = self.connect().await?;
        self.bounded(async {
            let ts = fetch_last_update(&mut conn).await?;
            conn.close().await?;
            Ok(ts)
        })
        .await
    }

    /// Connect, write a row, read it back, delete it, then fetch the worker
    /// timestamp. Each stage sets its flag; the first failure stops the probe.
    pub async fn probe(&self) -> PostgresStatus {
        let mut status = PostgresStatus {
            connected: false,
            writable: false,
            readable: false,
            host: self.config.host.clone(),
            postgres_last_update: None,
            error: None,
        };

        if let Err(e) = self.run_probe(&mut status).await {
            tracing::error!(host = %self.config.host, error = %e, "PostgreSQL connectivity test failed");
            status.error = Some(e.to_string());
        }
        status
    }

    async fn run_probe(&self, status: &mut PostgresStatus) -> BackendResult<()> {
        let conn = self.connect().await?;
        status.connected = true;
        tracing::debug!("PostgreSQL connection established");

        self.bounded(probe_queries(conn, status)).await
    }
}

/// Write, read back, and delete a probe row, then fetch the worker timestamp.
async fn probe_queries(mut conn: PgConnection, status: &mut PostgresStatus) -> BackendResult<()> {
    let id: i32 = sqlx::query_scalar("INSERT INTO test_data (message) VALUES ($1) RETURNING id")
        .bind(PROBE_MESSAGE)
        .fetch_one(&mut conn)
        .await?;
    status.writable = true;

    let message: String = sqlx::query_scalar("SELECT message FROM test_data WHERE id = $1")
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
    status.readable = message == PROBE_MESSAGE;

    sqlx::query("DELETE FROM test_data WHERE id = $1")
        .bind(id)
        .execute(&mut conn)
        .await?;

    // A missing table only means the worker has not run yet.
    match fetch_last_update(&mut conn).await {
        Ok(ts) => status.postgres_last_update = ts.map(|t| t.to_rfc3339()),
        Err(e) => tracing::debug!(error = %e, "Could not fetch worker timestamp from PostgreSQL"),
    }

    conn.close().await?;
    Ok(())
}

async fn fetch_last_update(conn: &mut PgConnection) -> BackendResult<Option<DateTime<Utc>>> {
    let ts = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT timestamp FROM last_update WHERE source = $1",
    )
    .bind(WORKER_SOURCE)
    .fetch_optional(conn)
    .await?;
    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> PostgresBackend {
        PostgresBackend::new(PostgresConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ssl_mode: "disable".into(),
            connect_timeout_secs: 2,
            ..PostgresConfig::default()
        })
    }

    #[test]
    fn test_rejects_unknown_ssl_mode() {
        let backend = PostgresBackend::new(PostgresConfig {
            ssl_mode: "sometimes".into(),
            ..PostgresConfig::default()
        });
        assert!(matches!(
            backend.connect_options(),
            Err(BackendError::Postgres(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_reports_unreachable_host() {
        let status = unreachable().probe().await;
        assert!(!status.connected);
        assert!(!status.writable);
        assert!(!status.readable);
        assert_eq!(status.host, "127.0.0.1");
        assert!(status.postgres_last_update.is_none());
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn test_upsert_fails_without_server() {
        let err = unreachable().upsert_last_update(Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Postgres(_) | BackendError::Timeout { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_query_section_times_out() {
        let err = unreachable()
            .bounded(std::future::pending::<BackendResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Timeout {
                backend: "postgres",
                secs: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend = PostgresBackend::new(PostgresConfig {
            host: "127.0.0.1".into(),
            port,
            ssl_mode: "disable".into(),
            connect_timeout_secs: 1,
            ..PostgresConfig::default()
        });
        let err = backend.upsert_last_update(Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Timeout {
                backend: "postgres",
                secs: 1
            }
        ));
    }
}
