//! HTTP server
//!
//! Routes:
//! - `/healthz`, `/readyz` - Kubernetes probes
//! - `/`, `/test-env`, `/version`, `/secret` - config and metadata
//! - `/pvc-test`, `/db/requests` - volume and database smoke tests (POST)
//! - `/swagger.json`, `/swagger` - API docs
//! - `/metrics` - Prometheus

pub mod docs;
pub mod handlers;
mod health;
mod metrics;
mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use metrics::{create_metrics, AppMetrics, SharedMetrics};
pub use shutdown::{serve_with_shutdown, termination_signal, ShutdownOutcome};

use crate::config::Settings;
use crate::lifecycle::Lifecycle;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub lifecycle: Arc<Lifecycle>,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(settings: Settings, lifecycle: Arc<Lifecycle>, metrics: SharedMetrics) -> Self {
        Self {
            settings: Arc::new(settings),
            lifecycle,
            metrics,
        }
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::hello))
        .route("/test-env", get(handlers::test_env))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(handlers::version))
        .route("/secret", get(handlers::secret))
        .route(
            "/pvc-test",
            post(handlers::pvc_test).fallback(handlers::post_only),
        )
        .route(
            "/db/requests",
            post(handlers::insert_request).fallback(handlers::post_only),
        )
        .route("/swagger.json", get(docs::swagger_json))
        .route("/swagger", get(docs::swagger_ui))
        .route("/swagger/", get(docs::swagger_ui))
        .route("/metrics", get(handlers::metrics))
        .fallback(handlers::hello)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "handlers_test.rs"]
mod handlers_tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
