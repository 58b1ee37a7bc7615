//! Endpoint handlers other than the probes

use super::AppState;
use crate::db::InsertedRow;
use crate::error::{AppError, ErrorBody};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Service version, overridable at build time through `APP_VERSION`
pub const VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Compiler that built this binary, captured by `build.rs`
pub const RUSTC_VERSION: &str = env!("PODPROBE_RUSTC_VERSION");

const SECRET_MARKER: &str = "***";

/// Mask a secret for display.
///
/// Empty stays empty; one to three characters become the bare marker;
/// anything longer keeps its first and last character around the marker.
pub fn mask_secret(secret: &str) -> String {
    let mut chars = secret.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if secret.chars().count() <= 3 {
        return SECRET_MARKER.to_string();
    }
    let last = chars.next_back().unwrap_or(first);
    format!("{first}{SECRET_MARKER}{last}")
}

#[derive(Serialize, ToSchema)]
pub struct Greeting {
    pub message: String,
}

/// `GET /` and every unrouted path
#[utoipa::path(
    get,
    path = "/",
    tag = "hello",
    summary = "Returns greeting message with the request URI",
    responses((status = 200, description = "Greeting", body = Greeting))
)]
pub async fn hello(uri: Uri) -> Json<Greeting> {
    let request_uri = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Json(Greeting {
        message: format!("Hi there! RequestURI is {request_uri}"),
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestEnv {
    pub config_map_env_var: String,
}

#[utoipa::path(
    get,
    path = "/test-env",
    tag = "config-map",
    summary = "Returns value configured via APP_CONFIG_MAP_ENV_VAR",
    responses((status = 200, description = "Passthrough value", body = TestEnv))
)]
pub async fn test_env(State(state): State<AppState>) -> Json<TestEnv> {
    Json(TestEnv {
        config_map_env_var: state.settings.config_map_env_var.clone(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct VersionInfo {
    pub version: String,
    /// Compiler version, e.g. `rustc 1.83.0 (90b35a623 2024-11-26)`
    #[serde(rename = "runtime-version")]
    pub runtime_version: String,
}

#[utoipa::path(
    get,
    path = "/version",
    tag = "version",
    summary = "Returns service version and compiler version",
    responses((status = 200, description = "Version", body = VersionInfo))
)]
pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: VERSION.to_string(),
        runtime_version: RUSTC_VERSION.to_string(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct MaskedSecret {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/secret",
    tag = "secret",
    summary = "Returns masked secret values injected via environment",
    responses((status = 200, description = "Masked secret", body = MaskedSecret))
)]
pub async fn secret(State(state): State<AppState>) -> Json<MaskedSecret> {
    Json(MaskedSecret {
        username: state.settings.secret_username.clone(),
        password: mask_secret(&state.settings.secret_password),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PvcTestResult {
    pub file: String,
    pub path: String,
    pub size_bytes: u64,
    pub pod_name: String,
}

/// `POST /pvc-test`: write a stamped file into the data directory
///
/// Fails without touching the filesystem when no directory is configured.
#[utoipa::path(
    post,
    path = "/pvc-test",
    tag = "pvcTest",
    summary = "Creates a test file inside the mounted data directory",
    responses(
        (status = 201, description = "File written", body = PvcTestResult),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 500, description = "Filesystem error or data directory not configured", body = ErrorBody)
    )
)]
pub async fn pvc_test(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<PvcTestResult>), AppError> {
    let dir = state
        .settings
        .data_dir
        .as_ref()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or(AppError::DataDirNotConfigured)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AppError::Filesystem { op: "mkdir", source })?;

    let pod_name = state.settings.pod_name.clone();
    let now = Utc::now();
    let file = format!(
        "{}-{}.txt",
        pod_name,
        now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros())
    );
    let path = dir.join(&file);
    let content = format!(
        "pod={} created at {}\n",
        pod_name,
        now.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );

    tokio::fs::write(&path, content)
        .await
        .map_err(|source| AppError::Filesystem { op: "write", source })?;
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|source| AppError::Filesystem { op: "stat", source })?;

    info!(path = %path.display(), size = metadata.len(), "Volume test file written");

    Ok((
        StatusCode::CREATED,
        Json(PvcTestResult {
            file,
            path: path.display().to_string(),
            size_bytes: metadata.len(),
            pod_name,
        }),
    ))
}

/// `POST /db/requests`: insert one row and return its id and timestamp
///
/// Opens the database on first use. Insert failures are not retried.
#[utoipa::path(
    post,
    path = "/db/requests",
    tag = "db",
    summary = "Creates a database record with the request timestamp",
    responses(
        (status = 200, description = "Inserted row", body = InsertedRow),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 500, description = "Insert failed", body = ErrorBody),
        (status = 503, description = "Database not initialized", body = ErrorBody)
    )
)]
pub async fn insert_request(State(state): State<AppState>) -> Response {
    let store = match state.lifecycle.ensure_database().await {
        Ok(Some(store)) => store,
        Ok(None) => {
            state.metrics.record_insert("unavailable");
            return AppError::DatabaseUnavailable.into_response();
        }
        Err(e) => {
            warn!(error = %e, "Database not reachable for insert");
            state.metrics.record_insert("unavailable");
            return AppError::DatabaseUnavailable.into_response();
        }
    };

    match store.insert_request().await {
        Ok(row) => {
            state.metrics.record_insert("success");
            (StatusCode::OK, Json(row)).into_response()
        }
        Err(e) => {
            state.metrics.record_insert("error");
            AppError::from(e).into_response()
        }
    }
}

/// Fallback for POST-only routes
pub async fn post_only() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody {
            error: "method not allowed".to_string(),
        }),
    )
}

/// `GET /metrics`
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    summary = "Prometheus metrics",
    responses(
        (status = 200, description = "Prometheus text format", body = String, content_type = "text/plain"),
        (status = 500, description = "Encoding failed", body = ErrorBody)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
