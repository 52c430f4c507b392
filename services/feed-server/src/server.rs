//! Listener lifecycle for the feed and health servers.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::{net::TcpListener, sync::watch, task::JoinError};
use tracing::{error, info, warn};

/// Serve the feed and health routers until `shutdown_signal` resolves or the
/// feed server exits.
///
/// Both listeners then stop accepting and get `shutdown_timeout` each to
/// finish in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    health_listener: TcpListener,
    health_app: Router,
    shutdown_signal: impl Future<Output = ()>,
    shutdown_timeout: Duration,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(wait_for_shutdown(shutdown_rx, "HTTP server"))
                .await
        }
    });

    let health_handle = tokio::spawn(async move {
        axum::serve(health_listener, health_app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx, "Health server"))
            .await
    });

    let server_running = tokio::select! {
        _ = shutdown_signal => {
            info!("Received shutdown signal");
            true
        }
        result = &mut server_handle => {
            log_server_exit("HTTP server", result);
            false
        }
    };

    let _ = shutdown_tx.send(true);

    if server_running {
        match tokio::time::timeout(shutdown_timeout, server_handle).await {
            Ok(result) => log_server_exit("HTTP server", result),
            Err(_) => warn!("HTTP server did not shut down in time"),
        }
    }
    match tokio::time::timeout(shutdown_timeout, health_handle).await {
        Ok(result) => log_server_exit("Health server", result),
        Err(_) => warn!("Health server did not shut down in time"),
    }
}

fn log_server_exit(name: &'static str, result: Result<std::io::Result<()>, JoinError>) {
    match result {
        Ok(Ok(())) => info!(server = name, "Server exited normally"),
        Ok(Err(e)) => error!(server = name, error = %e, "Server error"),
        Err(e) => error!(server = name, error = %e, "Server task panicked"),
    }
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>, name: &'static str) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!(server = name, "Shutting down");
}
