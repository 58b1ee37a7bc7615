use anyhow::Context;
use podprobe::config::Settings;
use podprobe::lifecycle::Lifecycle;
use podprobe::server::{
    create_metrics, router, serve_with_shutdown, termination_signal, AppState, ShutdownOutcome,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Budget for the eager database attempt made before serving
const STARTUP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("config load error")?;
    podprobe::logging::init(&settings.log_level);

    info!(
        port = settings.port,
        warmup_secs = settings.readiness_warmup().as_secs(),
        shutdown_timeout_secs = settings.shutdown_timeout().as_secs(),
        pod_name = %settings.pod_name,
        "Starting podprobe"
    );

    let lifecycle = Arc::new(Lifecycle::from_settings(&settings));

    // Database problems never stop the server; readiness retries lazily.
    match settings.database() {
        None => info!(
            "Postgres not configured (APP_POSTGRES_USER/DB empty) - DB features disabled"
        ),
        Some(pg) => match lifecycle.ensure_database_within(STARTUP_CONNECT_TIMEOUT).await {
            Ok(_) => info!(host = %pg.host, database = %pg.database, "Postgres client initialized"),
            Err(e) => warn!(error = %e, "Failed to init postgres, will retry on demand"),
        },
    }

    let metrics = create_metrics().context("failed to create metrics registry")?;
    let port = settings.port;
    let shutdown_timeout = settings.shutdown_timeout();
    let app = router(AppState::new(settings, lifecycle.clone(), metrics));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "HTTP server listening");

    let outcome = serve_with_shutdown(listener, app, termination_signal(), shutdown_timeout).await;
    if outcome == ShutdownOutcome::Forced {
        warn!("In-flight requests aborted at shutdown");
    }

    // Listener and every connection task are gone; nothing can touch the pool.
    lifecycle.close_database().await;
    Ok(())
}
