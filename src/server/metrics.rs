//! Prometheus metrics for the HTTP service
//!
//! Exposes:
//! - Request counts and latencies per route
//! - Readiness check outcomes
//! - Database insert results

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

/// Service metrics registry
///
/// Clone is cheap (the prometheus collectors are Arc internally).
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    /// Requests by method, route and status code
    pub http_requests_total: IntCounterVec,
    /// Request duration in seconds by route
    pub http_request_duration_seconds: HistogramVec,
    /// Readiness checks by reported reason
    pub readiness_checks_total: IntCounterVec,
    /// Inserts into `requests` by result (success, error, unavailable)
    pub db_inserts_total: IntCounterVec,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("podprobe_http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "podprobe_http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let readiness_checks_total = IntCounterVec::new(
            Opts::new(
                "podprobe_readiness_checks_total",
                "Readiness checks by outcome",
            ),
            &["ready"], // true, warming, db-connecting, db-ping-fail
        )?;
        registry.register(Box::new(readiness_checks_total.clone()))?;

        let db_inserts_total = IntCounterVec::new(
            Opts::new("podprobe_db_inserts_total", "Inserts into the requests table"),
            &["result"],
        )?;
        registry.register(Box::new(db_inserts_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            readiness_checks_total,
            db_inserts_total,
        })
    }

    pub fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[path])
            .observe(duration_secs);
    }

    pub fn record_readiness(&self, ready: &str) {
        self.readiness_checks_total.with_label_values(&[ready]).inc();
    }

    pub fn record_insert(&self, result: &str) {
        self.db_inserts_total.with_label_values(&[result]).inc();
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

pub type SharedMetrics = Arc<AppMetrics>;

pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(AppMetrics::new()?))
}

/// Middleware recording every request against its matched route
///
/// Requests that hit the fallback are labelled `fallback` to keep
/// label cardinality bounded.
pub async fn track_requests(
    State(metrics): State<SharedMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "fallback".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    metrics.record_request(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
