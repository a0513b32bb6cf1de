//! AWS Secrets Manager client.
//!
//! The secret holds a JSON document whose `updated_at` field is the worker's
//! last update. The worker replaces the whole document on every cycle.

use aws_sdk_secretsmanager::config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::backends::error::{BackendError, BackendResult};
use crate::backends::identity::RolesAnywhere;
use crate::config::AwsConfig;

/// Current value of the secret.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretSnapshot {
    pub name: String,
    pub value: Option<String>,
    pub arn: Option<String>,
    pub version_id: Option<String>,
}

impl SecretSnapshot {
    /// The `updated_at` field, if the secret is a JSON object carrying one.
    pub fn updated_at(&self) -> Option<String> {
        let value: Value = serde_json::from_str(self.value.as_deref()?).ok()?;
        value.get("updated_at")?.as_str().map(String::from)
    }
}

/// Result of the `/secret/status` probe.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SecretStatus {
    pub ok: bool,
    pub secret_value: Option<String>,
    pub secret_name: Option<String>,
    pub secret_arn: Option<String>,
    pub version_id: Option<String>,
    pub secret_last_update: Option<String>,
    pub error: Option<String>,
}

/// Build the document the worker stores.
pub fn timestamp_payload(
    at: DateTime<Utc>,
    region: &str,
    role_arn: Option<&str>,
    update_cycle: &str,
) -> Value {
    json!({
        "test_value": "This is a test secret from worker",
        "updated_at": at.to_rfc3339(),
        "updated_by": "worker_service",
        "metadata": {
            "region": region,
            "role_arn": role_arn,
            "update_cycle": update_cycle,
        }
    })
}

#[derive(Debug, Clone)]
pub struct SecretsStore {
    secret_name: String,
    identity: RolesAnywhere,
    update_cycle: String,
}

/// Cycle label written when the store is not told the worker interval.
const DEFAULT_CYCLE_SECS: u64 = 60;

fn cycle_label(interval_secs: u64) -> String {
    format!("automated_{interval_secs}s")
}

impl SecretsStore {
    pub fn new(config: AwsConfig) -> Self {
        Self {
            secret_name: config.secret_name.clone(),
            identity: RolesAnywhere::new(config),
            update_cycle: cycle_label(DEFAULT_CYCLE_SECS),
        }
    }

    /// Label payloads with the worker's actual interval.
    pub fn with_cycle_interval(mut self, interval_secs: u64) -> Self {
        self.update_cycle = cycle_label(interval_secs);
        self
    }

    pub fn update_cycle(&self) -> &str {
        &self.update_cycle
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn identity(&self) -> &RolesAnywhere {
        &self.identity
    }

    async fn client(&self) -> BackendResult<Client> {
        let credentials = self.identity.acquire().await?;
        let config = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.identity.region().to_string()))
            .credentials_provider(credentials.to_sdk())
            .build();
        Ok(Client::from_conf(config))
    }

    /// Replace the secret with a fresh timestamp payload.
    pub async fn write_timestamp(&self, at: DateTime<Utc>) -> BackendResult<()> {
        let client = self.client().await?;
        let payload = timestamp_payload(
            at,
            self.identity.region(),
            self.identity.role_arn(),
            &self.update_cycle,
        );

        tracing::debug!(secret = %self.secret_name, "Updating secret with new JSON payload");
        client
            .update_secret()
            .secret_id(&self.secret_name)
            .secret_string(payload.to_string())
            .send()
            .await
            .map_err(|e| BackendError::Aws(format!("UpdateSecret: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    /// Fetch the current secret value.
    pub async fn read(&self) -> BackendResult<SecretSnapshot> {
        let client = self.client().await?;
        let output = client
            .get_secret_value()
            .secret_id(&self.secret_name)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception());
                if not_found {
                    BackendError::Aws(format!("Secret '{}' not found", self.secret_name))
                } else {
                    BackendError::Aws(format!("GetSecretValue: {}", DisplayErrorContext(&e)))
                }
            })?;

        Ok(SecretSnapshot {
            name: output.name().unwrap_or(self.secret_name.as_str()).to_string(),
            value: output.secret_string().map(String::from),
            arn: output.arn().map(String::from),
            version_id: output.version_id().map(String::from),
        })
    }

    /// Read the secret and shape the result for the status endpoint.
    pub async fn status(&self) -> SecretStatus {
        match self.read().await {
            Ok(snapshot) => SecretStatus {
                ok: true,
                secret_last_update: snapshot.updated_at(),
                secret_value: snapshot.value,
                secret_name: Some(snapshot.name),
                secret_arn: snapshot.arn,
                version_id: snapshot.version_id,
                error: None,
            },
            Err(e) => {
                tracing::error!(secret = %self.secret_name, error = %e, "Secrets Manager retrieval failed");
                SecretStatus {
                    ok: false,
                    secret_value: None,
                    secret_name: Some(self.secret_name.clone()),
                    secret_arn: None,
                    version_id: None,
                    secret_last_update: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
