//! Batch job entrypoint: records one row in `cron_runs` and prints `OK`

use anyhow::Context;
use podprobe::config::Settings;
use podprobe::cronjob::{connector_from_settings, run_once, RetryPolicy};
use podprobe::server::termination_signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("config load error")?;
    podprobe::logging::init(&settings.log_level);

    let connector = connector_from_settings(&settings)?;
    let policy = RetryPolicy::default();
    info!(
        host = %settings.postgres.host,
        database = %settings.postgres.database,
        attempts = policy.attempts,
        "Starting batch run"
    );

    let row = run_once(&connector, &policy, termination_signal()).await?;
    info!(id = row.id, executed_at = %row.created_at.to_rfc3339(), "Inserted cron run");
    println!("OK");
    Ok(())
}
