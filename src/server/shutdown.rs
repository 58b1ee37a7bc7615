//! Graceful shutdown
//!
//! On SIGINT/SIGTERM the listener stops accepting and in-flight requests get
//! up to the configured timeout to finish. Connections still open after that
//! are aborted, together with the handlers running on them.

use axum::body::Body;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower::Service;
use tracing::{debug, error, info, warn};

/// How the server stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// All in-flight requests finished within the timeout
    Graceful,
    /// The timeout expired and remaining connections were aborted
    Forced,
}

/// Wait for SIGINT or SIGTERM
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}

/// Serve `app` until `shutdown` resolves, then drain for at most `timeout`
///
/// Every connection runs in a task owned by this function, so once it
/// returns no handler is left running.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    timeout: Duration,
) -> ShutdownOutcome
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, remote_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                if let Err(e) = socket.set_nodelay(true) {
                    warn!(error = %e, "Failed to set TCP_NODELAY");
                }

                let app = app.clone();
                let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
                    let mut app = app.clone();
                    app.call(req.map(Body::new))
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(socket), service);
                let conn = graceful.watch(conn);
                connections.spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(remote = %remote_addr, error = %e, "Connection closed");
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            () = &mut shutdown => break,
        }
    }

    drop(listener);
    info!(
        timeout_secs = timeout.as_secs_f64(),
        open_connections = connections.len(),
        "Shutdown requested, draining connections"
    );

    match tokio::time::timeout(timeout, graceful.shutdown()).await {
        Ok(()) => {
            while connections.join_next().await.is_some() {}
            info!("Server stopped gracefully");
            ShutdownOutcome::Graceful
        }
        Err(_) => {
            warn!(
                open_connections = connections.len(),
                "Graceful shutdown timed out, aborting connections"
            );
            connections.shutdown().await;
            ShutdownOutcome::Forced
        }
    }
}
