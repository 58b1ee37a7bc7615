//! One-shot batch job: connect with bounded retries, record a run, exit
//!
//! The binary in `src/bin/cronjob.rs` wires this to the environment and
//! SIGINT/SIGTERM; everything here works against the [`Connector`] seam.

use crate::config::Settings;
use crate::db::{with_timeout, Connector, DbError, InsertedRow, PgConnector, Store};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CronError {
    #[error("postgres config incomplete (need APP_POSTGRES_HOST/USER/DB; missing: {})", .0.join(", "))]
    Config(Vec<&'static str>),

    #[error("connect failed after {attempts} attempts: {source}")]
    Connect { attempts: u32, source: DbError },

    #[error("batch run exceeded {}s deadline", .0.as_secs())]
    DeadlineExceeded(Duration),

    #[error("batch run cancelled by signal")]
    Cancelled,

    #[error("insert failed: {0}")]
    Insert(DbError),
}

/// Connection retry budget for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
    /// Bound on the whole run, connect and insert included
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(5),
            deadline: Duration::from_secs(30),
        }
    }
}

/// Postgres connector for the batch job, which needs host, user and database
pub fn connector_from_settings(settings: &Settings) -> Result<PgConnector, CronError> {
    let missing = settings.postgres.missing_fields();
    if !missing.is_empty() {
        return Err(CronError::Config(missing));
    }
    Ok(PgConnector::new(settings.postgres.clone()))
}

/// Try to connect up to `policy.attempts` times, sleeping `policy.delay` in between
pub async fn connect_with_retry(
    connector: &dyn Connector,
    policy: &RetryPolicy,
) -> Result<Arc<dyn Store>, CronError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match with_timeout("connect", policy.attempt_timeout, connector.connect()).await {
            Ok(store) => {
                info!(attempt, "Connected to postgres");
                return Ok(store);
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, max_attempts = attempts, error = %e, "Postgres connect failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(CronError::Connect {
                    attempts,
                    source: e,
                })
            }
        }
    }
}

/// Connect, insert one `cron_runs` row and close the pool.
///
/// The run stops early with [`CronError::Cancelled`] when `cancel` resolves and
/// with [`CronError::DeadlineExceeded`] once `policy.deadline` has passed.
pub async fn run_once<F>(
    connector: &dyn Connector,
    policy: &RetryPolicy,
    cancel: F,
) -> Result<InsertedRow, CronError>
where
    F: Future<Output = ()>,
{
    let run = async {
        let store = connect_with_retry(connector, policy).await?;
        let inserted = store.insert_cron_run().await;
        store.close().await;
        inserted.map_err(CronError::Insert)
    };

    tokio::select! {
        result = tokio::time::timeout(policy.deadline, run) => {
            result.map_err(|_| CronError::DeadlineExceeded(policy.deadline))?
        }
        _ = cancel => Err(CronError::Cancelled),
    }
}

#[cfg(test)]
#[path = "cronjob_test.rs"]
mod tests;
