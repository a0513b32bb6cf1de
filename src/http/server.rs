//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all status handlers
//! - Wire up middleware (tracing, timeout, request ID, CORS, no-cache headers)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backends::{PostgresBackend, SecretsStore, ValkeyBackend};
use crate::config::{AppConfig, HttpConfig};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate, max-age=0";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub postgres: PostgresBackend,
    pub valkey: ValkeyBackend,
    pub secrets: SecretsStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            postgres: PostgresBackend::new(config.postgres.clone()),
            valkey: ValkeyBackend::new(config.valkey.clone()),
            secrets: SecretsStore::new(config.aws.clone()),
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the status API.
pub struct ApiServer {
    router: Router,
    state: AppState,
}

impl ApiServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let state = AppState::new(config);
        let router = Self::build_router(&state.config.http, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(http: &HttpConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/db/status", get(handlers::db_status))
            .route("/iam/status", get(handlers::iam_status))
            .route("/secret/status", get(handlers::secret_status))
            .route("/worker/status", get(handlers::worker_status))
            .with_state(state)
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static(NO_CACHE),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("0"),
            ))
            .layer(cors_layer(&http.cors_origins))
            .layer(TimeoutLayer::new(Duration::from_secs(http.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    tracing::debug!(origins = ?origins, "Configuring CORS");

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
