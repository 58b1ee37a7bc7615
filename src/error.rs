use crate::db::DbError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Errors returned by HTTP handlers
///
/// The response body is `{"error": <message>}`. Backend and filesystem
/// messages are passed through unchanged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("dataDir not configured")]
    DataDirNotConfigured,

    #[error("{op}: {source}")]
    Filesystem {
        op: &'static str,
        source: std::io::Error,
    },

    #[error("db client not initialized")]
    DatabaseUnavailable,

    #[error("{0}")]
    Database(#[from] DbError),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DataDirNotConfigured
            | AppError::Filesystem { .. }
            | AppError::Database(_)
            | AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
