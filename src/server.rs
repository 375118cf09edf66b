use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracker_hub::BroadcastHub;

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

/// Periodically drop connections whose socket task has gone away
pub fn spawn_cleanup(hub: BroadcastHub, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Cleanup task cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let cleaned = hub.cleanup_dead_connections();
                    let active = hub.connected_count();
                    if cleaned > 0 {
                        tracing::info!(active_connections = active, cleaned, "Connection status");
                    } else {
                        tracing::debug!(active_connections = active, "Connection status");
                    }
                }
            }
        }
    })
}

/// Serve on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(&config).await?;
    let cancel = CancellationToken::new();

    let cleanup = spawn_cleanup(
        state.hub.clone(),
        Duration::from_secs(config.hub.cleanup_interval_secs.max(1)),
        cancel.clone(),
    );

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let store = state.store().clone();
    let shutdown_cancel = cancel.clone();
    serve(listener, state, async move {
        shutdown_signal().await;
        shutdown_cancel.cancel();
    })
    .await?;

    cancel.cancel();
    let _ = cleanup.await;
    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
