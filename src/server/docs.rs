//! API documentation: an OpenAPI document and a Swagger UI page that loads it
//!
//! The document is generated with utoipa from the handler annotations.

use super::handlers::{self, Greeting, MaskedSecret, PvcTestResult, TestEnv, VersionInfo, VERSION};
use super::health::{self, HealthStatus, ReadyStatus};
use crate::db::InsertedRow;
use crate::error::ErrorBody;
use axum::response::Html;
use axum::Json;
use utoipa::OpenApi;

const SWAGGER_UI: &str = r#"<!DOCTYPE html><html lang="en"><head><meta charset="UTF-8"/><title>Swagger UI</title>
<link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
<style>body{margin:0;padding:0;}#swagger-ui{box-sizing:border-box;}</style></head>
<body><div id="swagger-ui"></div><script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>window.onload=function(){SwaggerUIBundle({url:'/swagger.json',dom_id:'#swagger-ui',layout:'BaseLayout'});};</script></body></html>"#;

/// podprobe OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "podprobe",
        description = "Health/readiness, version, secrets, volume smoke test and database demo endpoints.",
        license(name = "MIT")
    ),
    tags(
        (name = "hello", description = "Greeting"),
        (name = "config-map", description = "Config passthrough"),
        (name = "healthcheck", description = "Kubernetes probes"),
        (name = "version", description = "Build metadata"),
        (name = "secret", description = "Masked secrets"),
        (name = "pvcTest", description = "Volume smoke test"),
        (name = "db", description = "Database smoke test"),
        (name = "metrics", description = "Prometheus metrics")
    ),
    paths(
        handlers::hello,
        handlers::test_env,
        health::healthz,
        health::readyz,
        handlers::version,
        handlers::secret,
        handlers::pvc_test,
        handlers::insert_request,
        handlers::metrics,
    ),
    components(schemas(
        Greeting,
        TestEnv,
        HealthStatus,
        ReadyStatus,
        VersionInfo,
        MaskedSecret,
        PvcTestResult,
        InsertedRow,
        ErrorBody,
    ))
)]
pub struct ApiDoc;

/// OpenAPI document with the service version filled in
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.version = VERSION.to_string();
    doc
}

pub async fn swagger_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}
