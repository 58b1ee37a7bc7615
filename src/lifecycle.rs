//! Process lifecycle: readiness and the lazily opened database
//!
//! Readiness is gated by a warmup period after start. Once warm, a configured
//! database must be reachable: the pool is opened on first need and pinged on
//! every readiness check.

use crate::config::Settings;
use crate::db::{with_timeout, Connector, DbError, PgConnector, Store};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Budget for the ping issued by each readiness check
pub const READINESS_PING_TIMEOUT: Duration = Duration::from_millis(500);

/// Budget for a lazy connection attempt made on behalf of a request
pub const LAZY_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Still inside the warmup window
    Warming,
    /// Database configured but the pool could not be opened
    DbConnecting,
    /// Pool open but the ping failed or timed out
    DbPingFail,
}

impl Readiness {
    /// Value reported in the `ready` field of `/readyz`
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Ready => "true",
            Readiness::Warming => "warming",
            Readiness::DbConnecting => "db-connecting",
            Readiness::DbPingFail => "db-ping-fail",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Owns start time, warmup and the database handle.
///
/// The handle goes from absent to present at most once and is never reset.
/// Concurrent first callers of [`Lifecycle::ensure_database`] share a single
/// connection attempt.
pub struct Lifecycle {
    started_at: Instant,
    warmup: Duration,
    connector: Option<Arc<dyn Connector>>,
    database: OnceCell<Arc<dyn Store>>,
}

impl Lifecycle {
    /// `connector` is `None` when no database is configured.
    pub fn new(warmup: Duration, connector: Option<Arc<dyn Connector>>) -> Self {
        Self {
            started_at: Instant::now(),
            warmup,
            connector,
            database: OnceCell::new(),
        }
    }

    /// Build from settings, wiring a Postgres connector when configured
    pub fn from_settings(settings: &Settings) -> Self {
        let connector = settings.database().map(|pg| {
            let connector: Arc<dyn Connector> = Arc::new(PgConnector::new(pg.clone()));
            connector
        });
        Self::new(settings.readiness_warmup(), connector)
    }

    /// Override the start instant. Tests use this to simulate elapsed time.
    pub fn with_started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_warming(&self) -> bool {
        self.elapsed() < self.warmup
    }

    pub fn database_configured(&self) -> bool {
        self.connector.is_some()
    }

    /// The database handle if it has been opened
    pub fn database(&self) -> Option<Arc<dyn Store>> {
        self.database.get().cloned()
    }

    /// Open the database if configured and not yet open.
    ///
    /// Returns `Ok(None)` when no database is configured. A failed attempt
    /// leaves the handle absent so a later call can retry.
    pub async fn ensure_database(&self) -> Result<Option<Arc<dyn Store>>, DbError> {
        self.ensure_database_within(LAZY_CONNECT_TIMEOUT).await
    }

    /// [`Lifecycle::ensure_database`] with an explicit attempt budget
    pub async fn ensure_database_within(
        &self,
        budget: Duration,
    ) -> Result<Option<Arc<dyn Store>>, DbError> {
        let Some(connector) = self.connector.as_ref() else {
            return Ok(None);
        };

        if let Some(store) = self.database.get() {
            return Ok(Some(store.clone()));
        }

        let store = self
            .database
            .get_or_try_init(|| async {
                debug!(budget_ms = budget.as_millis() as u64, "Opening database");
                let store = with_timeout("connect", budget, connector.connect()).await?;
                info!("Database handle initialized");
                Ok::<_, DbError>(store)
            })
            .await?;

        Ok(Some(store.clone()))
    }

    /// Evaluate readiness. Each call pings again; success is never cached.
    pub async fn readiness(&self) -> Readiness {
        if self.is_warming() {
            return Readiness::Warming;
        }

        let store = match self.ensure_database().await {
            Ok(Some(store)) => store,
            Ok(None) => return Readiness::Ready,
            Err(e) => {
                warn!(error = %e, "Readiness: database not connected");
                return Readiness::DbConnecting;
            }
        };

        match with_timeout("ping", READINESS_PING_TIMEOUT, store.ping()).await {
            Ok(()) => Readiness::Ready,
            Err(e) => {
                warn!(error = %e, "Readiness: database ping failed");
                Readiness::DbPingFail
            }
        }
    }

    /// Close the pool if one was opened. Call only after the listener stopped.
    pub async fn close_database(&self) {
        if let Some(store) = self.database.get() {
            store.close().await;
            info!("Database pool closed");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
