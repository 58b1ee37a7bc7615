//! In-process stand-ins for the Postgres pool, used by unit tests

use super::{Connector, DbError, InsertedRow, Store};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Store that hands out sequential ids
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    ping_fails: AtomicBool,
    insert_fails: AtomicBool,
    ping_delay_ms: AtomicU32,
    closed: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_ping_fails(&self, fails: bool) {
        self.ping_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_insert_fails(&self, fails: bool) {
        self.insert_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_ping_delay(&self, delay: Duration) {
        self.ping_delay_ms
            .store(delay.as_millis() as u32, Ordering::SeqCst);
    }

    pub fn close_count(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }

    fn next_row(&self) -> Result<InsertedRow, DbError> {
        if self.insert_fails.load(Ordering::SeqCst) {
            return Err(DbError::Query {
                command: "insert request",
                error: sqlx::Error::Protocol("relation \"requests\" does not exist".to_string()),
            });
        }
        Ok(InsertedRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_request(&self) -> Result<InsertedRow, DbError> {
        self.next_row()
    }

    async fn insert_cron_run(&self) -> Result<InsertedRow, DbError> {
        self.next_row()
    }

    async fn ping(&self) -> Result<(), DbError> {
        let delay = self.ping_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(DbError::Connection {
                error: sqlx::Error::PoolClosed,
            });
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector returning a shared [`MemoryStore`], optionally failing first
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    attempts: AtomicU32,
    failures_left: AtomicU32,
    delay: Duration,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            attempts: AtomicU32::new(0),
            failures_left: AtomicU32::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Fail the first `n` attempts
    pub fn failing(store: Arc<MemoryStore>, n: u32) -> Self {
        let connector = Self::new(store);
        connector.failures_left.store(n, Ordering::SeqCst);
        connector
    }

    /// Never succeed
    pub fn unreachable() -> Self {
        Self::failing(MemoryStore::new(), u32::MAX)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn Store>, DbError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            if left != u32::MAX {
                self.failures_left.store(left - 1, Ordering::SeqCst);
            }
            return Err(DbError::Connection {
                error: sqlx::Error::PoolTimedOut,
            });
        }
        let store: Arc<dyn Store> = self.store.clone();
        Ok(store)
    }
}
