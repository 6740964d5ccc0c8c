//! wf-server: HTTP API for the watchify media library.
//!
//! Streams episodes and movies with range support, records uploads as
//! (row, blob) pairs, and deletes shows and movies stage by stage together
//! with their blobs.

pub mod audit;
pub mod cascade;
pub mod context;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod placeholder;
pub mod range;
pub mod router;
pub mod routes;
pub mod storage;
pub mod streamer;
pub mod upload;
pub mod writer;

use std::net::SocketAddr;

use wf_core::config::Config;
use wf_core::{Error, Result};
use wf_db::pool::init_pool;

use crate::context::AppContext;
use crate::storage::StorageLayout;

/// Start the watchify server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    StorageLayout::new(config.storage.app_dir.clone())
        .ensure()
        .await?;

    let db_path = config.db_path();
    tracing::info!("Opening database at {}", db_path.display());
    let pool = init_pool(&db_path.to_string_lossy())?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(AppContext::new(pool, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
