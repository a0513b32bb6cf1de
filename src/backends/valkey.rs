//! Valkey client.
//!
//! Speaks the Redis protocol through the `redis` crate. Managed Valkey only
//! accepts TLS, and its certificate is not verified unless `tls_verify` is set.

use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::backends::error::{BackendError, BackendResult};
use crate::config::ValkeyConfig;

/// Key holding the worker's last update.
pub const LAST_UPDATE_KEY: &str = "worker:last_update";

/// Key used by the SET/GET probe.
pub const PROBE_KEY: &str = "poc-test";
const PROBE_VALUE: &str = "success";

/// Result of the `/db/status` Valkey probe.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValkeyStatus {
    pub connected: bool,
    pub ping_ok: bool,
    pub set_get_ok: bool,
    pub host: String,
    pub valkey_last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValkeyBackend {
    config: ValkeyConfig,
}

impl ValkeyBackend {
    pub fn new(config: ValkeyConfig) -> Self {
        Self { config }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Build the connection URL, e.g. `rediss://:secret@host:25061/#insecure`.
    pub fn connection_url(&self) -> BackendResult<Url> {
        let scheme = if self.config.tls { "rediss" } else { "redis" };
        let mut url = Url::parse(&format!("{scheme}://{}:{}/", self.config.host, self.config.port))
            .map_err(|e| {
                BackendError::Valkey(redis::RedisError::from((
                    redis::ErrorKind::InvalidClientConfig,
                    "invalid Valkey address",
                    e.to_string(),
                )))
            })?;

        if let Some(password) = &self.config.password {
            // Infallible for URLs with a host.
            let _ = url.set_password(Some(password));
        }
        if self.config.tls && !self.config.tls_verify {
            url.set_fragment(Some("insecure"));
        }
        Ok(url)
    }

    async fn bounded<T, F>(&self, fut: F) -> BackendResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        let secs = self.config.timeout_secs;
        match timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(BackendError::Timeout {
                backend: "valkey",
                secs,
            }),
        }
    }

    async fn connect(&self) -> BackendResult<MultiplexedConnection> {
        let client = redis::Client::open(self.connection_url()?.as_str())?;
        self.bounded(client.get_multiplexed_async_connection()).await
    }

    /// Store `at` under [`LAST_UPDATE_KEY`].
    pub async fn set_last_update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        let mut conn = self.connect().await?;
        self.bounded(
            redis::cmd("SET")
                .arg(LAST_UPDATE_KEY)
                .arg(at.to_rfc3339())
                .query_async::<()>(&mut conn),
        )
        .await
    }

    /// Read [`LAST_UPDATE_KEY`]; `None` when the worker never ran.
    pub async fn get_last_update(&self) -> BackendResult<Option<String>> {
        let mut conn = self.connect().await?;
        self.bounded(
            redis::cmd("GET")
                .arg(LAST_UPDATE_KEY)
                .query_async::<Option<String>>(&mut conn),
        )
        .await
    }

    /// Connect, PING, SET/GET the probe key, then read the worker timestamp.
    pub async fn probe(&self) -> ValkeyStatus {
        let mut status = ValkeyStatus {
            connected: false,
            ping_ok: false,
            set_get_ok: false,
            host: self.config.host.clone(),
            valkey_last_update: None,
            error: None,
        };

        if let Err(e) = self.run_probe(&mut status).await {
            tracing::error!(host = %self.config.host, error = %e, "Valkey connectivity test failed");
            status.error = Some(e.to_string());
        }
        status
    }

    async fn run_probe(&self, status: &mut ValkeyStatus) -> BackendResult<()> {
        let mut conn = self.connect().await?;
        status.connected = true;

        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        status.ping_ok = pong == "PONG";

        self.bounded(
            redis::cmd("SET")
                .arg(PROBE_KEY)
                .arg(PROBE_VALUE)
                .query_async::<()>(&mut conn),
        )
        .await?;
        let value: Option<String> = self
            .bounded(redis::cmd("GET").arg(PROBE_KEY).query_async(&mut conn))
            .await?;
        status.set_get_ok = value.as_deref() == Some(PROBE_VALUE);

        match self
            .bounded(
                redis::cmd("GET")
                    .arg(LAST_UPDATE_KEY)
                    .query_async::<Option<String>>(&mut conn),
            )
            .await
        {
            Ok(ts) => status.valkey_last_update = ts,
            Err(e) => tracing::debug!(error = %e, "Could not fetch worker timestamp from Valkey"),
        }
        Ok(())
    }
}
