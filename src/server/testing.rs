//! Helpers shared by the server tests

use super::{create_metrics, router, AppState};
use crate::config::Settings;
use crate::lifecycle::Lifecycle;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_map(&vars).expect("test settings should load")
}

pub fn state_with(settings: Settings, lifecycle: Lifecycle) -> AppState {
    AppState::new(
        settings,
        Arc::new(lifecycle),
        create_metrics().expect("create metrics"),
    )
}

/// State with default settings and a lifecycle that is already warm
pub fn warm_state(settings: Settings) -> AppState {
    state_with(settings, Lifecycle::new(Duration::ZERO, None))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).expect("response body should be utf-8")
    }
}

pub async fn send(state: &AppState, method: Method, uri: &str) -> TestResponse {
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");

    TestResponse {
        status,
        headers,
        body,
    }
}
