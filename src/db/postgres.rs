//! Postgres pool backed by sqlx

use super::schema;
use super::{Connector, DbError, InsertedRow, Store};
use crate::config::PostgresSettings;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Connection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const MAX_CONN_IDLE_TIME: Duration = Duration::from_secs(2 * 60);
const MAX_CONN_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// An open connection pool with the schema in place
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Validate parameters, open the pool and ensure the schema.
    ///
    /// Host, user and database name are required; the password may be empty.
    pub async fn open(settings: &PostgresSettings) -> Result<Self, DbError> {
        let missing = settings.missing_fields();
        if !missing.is_empty() {
            return Err(DbError::Config(missing));
        }

        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .idle_timeout(Some(MAX_CONN_IDLE_TIME))
            .max_lifetime(Some(MAX_CONN_LIFETIME))
            .connect_with(options)
            .await
            .map_err(|error| DbError::Connection { error })?;

        let store = Self { pool };
        if let Err(e) = store.ensure_schema().await {
            store.pool.close().await;
            return Err(e);
        }

        info!(
            host = %settings.host,
            database = %settings.database,
            "Postgres pool opened"
        );
        Ok(store)
    }

    /// Create the tables if absent
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|error| DbError::Query {
                    command: "migrate",
                    error,
                })?;
        }
        debug!("Schema ensured");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_request(&self) -> Result<InsertedRow, DbError> {
        sqlx::query_as::<_, InsertedRow>(
            "INSERT INTO requests DEFAULT VALUES RETURNING id, created_at",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| DbError::Query {
            command: "insert request",
            error,
        })
    }

    async fn insert_cron_run(&self) -> Result<InsertedRow, DbError> {
        sqlx::query_as::<_, InsertedRow>(
            "INSERT INTO cron_runs DEFAULT VALUES RETURNING id, executed_at AS created_at",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| DbError::Query {
            command: "insert cron run",
            error,
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|error| DbError::Connection { error })?;
        conn.ping()
            .await
            .map_err(|error| DbError::Query {
                command: "ping",
                error,
            })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connector that opens a fresh [`PgStore`] per attempt
#[derive(Clone)]
pub struct PgConnector {
    settings: PostgresSettings,
}

impl PgConnector {
    pub fn new(settings: PostgresSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError> {
        let store: Arc<dyn Store> = Arc::new(PgStore::open(&self.settings).await?);
        Ok(store)
    }
}
