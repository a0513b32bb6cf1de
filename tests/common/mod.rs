//! Shared utilities for the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use integration_poc::backends::{BackendError, BackendResult};
use integration_poc::config::AppConfig;
use integration_poc::worker::TimestampUpdater;

/// How a [`FakeUpdater`] behaves when asked to update.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Behavior {
    Succeed,
    Fail(&'static str),
    Panic,
    /// Succeed after a delay.
    Slow(Duration),
}

/// In-memory updater that records every timestamp it is handed.
pub struct FakeUpdater {
    name: &'static str,
    behavior: Behavior,
    seen: Mutex<Vec<DateTime<Utc>>>,
}

#[allow(dead_code)]
impl FakeUpdater {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<DateTime<Utc>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl TimestampUpdater for FakeUpdater {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn update(&self, at: DateTime<Utc>) -> BackendResult<()> {
        self.seen.lock().unwrap().push(at);
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(reason) => Err(BackendError::Aws(reason.to_string())),
            Behavior::Panic => panic!("{} updater exploded", self.name),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }
}

/// Upcast helper so test vectors read cleanly.
#[allow(dead_code)]
pub fn dyn_updater(fake: &Arc<FakeUpdater>) -> Arc<dyn TimestampUpdater> {
    fake.clone() as Arc<dyn TimestampUpdater>
}

/// Configuration whose databases refuse connections and whose IAM inputs
/// are absent, so every probe fails fast without touching the network.
#[allow(dead_code)]
pub fn unreachable_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    config.postgres.host = "127.0.0.1".to_string();
    config.postgres.port = 1;
    config.postgres.database = "poc".to_string();
    config.postgres.user = "poc".to_string();
    config.postgres.ssl_mode = "disable".to_string();
    config.postgres.connect_timeout_secs = 2;

    config.valkey.host = "127.0.0.1".to_string();
    config.valkey.port = 1;
    config.valkey.tls = false;
    config.valkey.timeout_secs = 2;

    config.http.request_timeout_secs = 10;
    config
}
