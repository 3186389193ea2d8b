//! HTTP surface for review analysis: analyze, list, and health routes.

use std::net::SocketAddr;
use std::sync::Arc;

use revlens_core::ReviewOrchestrator;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod error;
pub use error::ServerError;

mod routes;
pub use routes::{ANALYZE_PATH, HEALTH_PATH, REVIEWS_PATH, SERVICE_NAME, build_router};

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, orchestrator: Arc<ReviewOrchestrator>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
    info!(%local_addr, "review API listening");

    axum::serve(listener, build_router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, draining connections"),
        _ = sigterm => info!("SIGTERM received, draining connections"),
    }
}
