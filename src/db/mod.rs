//! Database access: schema, Postgres pool and the seam used by the lifecycle
//!
//! Layout:
//! - `schema.rs`: DDL run on every connect
//! - `postgres.rs`: sqlx-backed pool implementing [`Store`] and [`Connector`]

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub use postgres::{PgConnector, PgStore};

/// Errors from the database accessor.
/// sqlx errors are wrapped with the operation that produced them.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("postgres config incomplete (missing: {})", .0.join(", "))]
    Config(Vec<&'static str>),

    #[error("connection failed with: {error}")]
    Connection { error: sqlx::Error },

    #[error("{command} query failed with: {error}")]
    Query {
        command: &'static str,
        error: sqlx::Error,
    },

    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u128 },
}

/// A row inserted into one of the timestamp tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertedRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Operations the service performs against an open pool
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert one row into `requests`; the server assigns the timestamp.
    async fn insert_request(&self) -> Result<InsertedRow, DbError>;

    /// Insert one row into `cron_runs`.
    async fn insert_cron_run(&self) -> Result<InsertedRow, DbError>;

    async fn ping(&self) -> Result<(), DbError>;

    /// Release pooled connections. Calling twice is harmless.
    async fn close(&self);
}

/// Opens a [`Store`]; one call is one connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError>;
}

/// Run `fut` with a deadline, mapping expiry to [`DbError::Timeout`]
pub async fn with_timeout<T, F>(
    operation: &'static str,
    budget: std::time::Duration,
    fut: F,
) -> Result<T, DbError>
where
    F: std::future::Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout {
            operation,
            millis: budget.as_millis(),
        }),
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod tests;
