//! Status API behavior against unreachable backends.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::unreachable_config;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

use integration_poc::config::AppConfig;
use integration_poc::http::{ApiServer, X_REQUEST_ID};
use integration_poc::lifecycle::Shutdown;

async fn get(config: AppConfig, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let router = ApiServer::new(config).router();
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn test_healthz() {
    let (status, headers, body) = get(unreachable_config(), "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
    assert!(headers.contains_key(X_REQUEST_ID));
}

#[tokio::test]
async fn test_responses_are_not_cacheable() {
    let (_, headers, _) = get(unreachable_config(), "/healthz").await;

    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate, max-age=0"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
}

#[tokio::test]
async fn test_db_status_reports_unreachable_backends() {
    let (status, _, body) = get(unreachable_config(), "/db/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["postgres"]["connected"], false);
    assert_eq!(body["postgres"]["writable"], false);
    assert_eq!(body["postgres"]["readable"], false);
    assert_eq!(body["postgres"]["host"], "127.0.0.1");
    assert!(body["postgres"]["error"].is_string());

    assert_eq!(body["valkey"]["connected"], false);
    assert_eq!(body["valkey"]["ping_ok"], false);
    assert_eq!(body["valkey"]["set_get_ok"], false);
    assert!(body["valkey"]["error"].is_string());
}

#[tokio::test]
async fn test_secret_status_without_iam_inputs() {
    let (status, _, body) = get(unreachable_config(), "/secret/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["secret_name"], "poc-app-platform/test-secret");
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Missing configuration"), "{error}");
    assert!(error.contains("IAM_ROLE_ARN"), "{error}");
}

#[tokio::test]
async fn test_iam_status_without_iam_inputs() {
    let (status, _, body) = get(unreachable_config(), "/iam/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Missing configuration"));
}

#[tokio::test]
async fn test_worker_status_is_error_when_nothing_reachable() {
    let (status, _, body) = get(unreachable_config(), "/worker/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_status"], "error");
    assert_eq!(body["stale_threshold_seconds"], 90);
    for store in ["postgres", "valkey", "secrets_manager"] {
        let entry = &body["timestamps"][store];
        assert_eq!(entry["status"], "error", "{store}");
        assert_eq!(entry["is_stale"], true, "{store}");
        assert!(entry["last_update"].is_null(), "{store}");
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _, _) = get(unreachable_config(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let mut config = unreachable_config();
    config.http.cors_origins = vec!["https://poc.example".to_string()];
    let router = ApiServer::new(config).router();

    let allowed = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::ORIGIN, "https://poc.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://poc.example"
    );

    let denied = router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::ORIGIN, "https://elsewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!denied
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_server_drains_on_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = ApiServer::new(unreachable_config());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let body: Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap()
        .unwrap();
}
