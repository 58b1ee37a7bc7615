//! Postgres integration tests
//!
//! Run with:
//!   APP_POSTGRES_HOST=localhost APP_POSTGRES_USER=postgres APP_POSTGRES_PASSWORD=postgres \
//!   APP_POSTGRES_DB=postgres cargo test --test postgres_test -- --ignored --nocapture
//!
//! Requirements:
//! - A reachable Postgres instance; the tests create `requests` and `cron_runs`

#![allow(clippy::expect_used)]

use podprobe::config::{PostgresSettings, Settings};
use podprobe::cronjob::{run_once, RetryPolicy};
use podprobe::db::{Connector, DbError, PgConnector, PgStore, Store};
use podprobe::lifecycle::{Lifecycle, Readiness};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

/// Postgres parameters from the environment, or `None` when incomplete
fn postgres() -> Option<PostgresSettings> {
    let settings = Settings::from_env().ok()?;
    settings
        .postgres
        .missing_fields()
        .is_empty()
        .then_some(settings.postgres)
}

#[tokio::test]
#[ignore]
async fn test_open_is_idempotent() {
    let Some(pg) = postgres() else {
        println!("Skipping: APP_POSTGRES_* not set");
        return;
    };

    // Schema creation must tolerate existing tables
    let first = PgStore::open(&pg).await.expect("first open");
    let second = PgStore::open(&pg).await.expect("second open");

    first.close().await;
    second.close().await;
}

#[tokio::test]
#[ignore]
async fn test_inserts_are_monotonic() {
    let Some(pg) = postgres() else {
        return;
    };
    let store = PgStore::open(&pg).await.expect("open");

    let first = store.insert_request().await.expect("first insert");
    let second = store.insert_request().await.expect("second insert");

    assert!(second.id > first.id);
    assert!(second.created_at >= first.created_at);
    store.close().await;
}

#[tokio::test]
#[ignore]
async fn test_ping_and_double_close() {
    let Some(pg) = postgres() else {
        return;
    };
    let store = PgStore::open(&pg).await.expect("open");

    store.ping().await.expect("ping");

    store.close().await;
    store.close().await;
    assert!(store.ping().await.is_err(), "closed pool refuses work");
}

#[tokio::test]
#[ignore]
async fn test_wrong_port_is_connection_error() {
    let Some(mut pg) = postgres() else {
        return;
    };
    pg.port = 1;

    let result = PgConnector::new(pg).connect().await;

    assert!(matches!(result, Err(DbError::Connection { .. })));
}

#[tokio::test]
#[ignore]
async fn test_lifecycle_ready_against_postgres() {
    let Some(pg) = postgres() else {
        return;
    };
    let connector: Arc<dyn Connector> = Arc::new(PgConnector::new(pg));
    let lifecycle = Lifecycle::new(Duration::ZERO, Some(connector));

    assert_eq!(lifecycle.readiness().await, Readiness::Ready);
    lifecycle.close_database().await;
}

#[tokio::test]
#[ignore]
async fn test_batch_run_records_row() {
    let Some(pg) = postgres() else {
        return;
    };

    let row = run_once(&PgConnector::new(pg), &RetryPolicy::default(), pending())
        .await
        .expect("batch run");

    assert!(row.id > 0);
}
