//! Status endpoint handlers.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::backends::{IamStatus, SecretStatus};
use crate::http::server::AppState;
use crate::http::status::{DbStatus, Healthz, WorkerStatus};
use crate::observability::metrics;

pub async fn healthz() -> Json<Healthz> {
    Json(Healthz { status: "ok" })
}

async fn probe_databases(state: &AppState) -> DbStatus {
    let (postgres, valkey) = tokio::join!(state.postgres.probe(), state.valkey.probe());
    metrics::record_probe("postgres", postgres.connected && postgres.writable && postgres.readable);
    metrics::record_probe("valkey", valkey.connected && valkey.ping_ok && valkey.set_get_ok);
    DbStatus { postgres, valkey }
}

async fn probe_secret(state: &AppState) -> SecretStatus {
    let status = state.secrets.status().await;
    metrics::record_probe("secrets_manager", status.ok);
    status
}

pub async fn db_status(State(state): State<AppState>) -> Json<DbStatus> {
    Json(probe_databases(&state).await)
}

pub async fn iam_status(State(state): State<AppState>) -> Json<IamStatus> {
    let status = state.secrets.identity().caller_identity().await;
    metrics::record_probe("iam", status.ok);
    Json(status)
}

pub async fn secret_status(State(state): State<AppState>) -> Json<SecretStatus> {
    Json(probe_secret(&state).await)
}

pub async fn worker_status(State(state): State<AppState>) -> Json<WorkerStatus> {
    let (db, secret) = tokio::join!(probe_databases(&state), probe_secret(&state));
    Json(WorkerStatus::from_probes(
        &db,
        &secret,
        Utc::now(),
        state.config.http.stale_threshold_secs,
    ))
}
