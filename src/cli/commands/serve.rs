use anyhow::Context;
use tracing::info;

use crate::app::{build_app, ensure_collections, resource_stores};
use crate::config::config;
use crate::database::DocumentStore;
use crate::upload::UploadStore;

/// Connect storage, prepare collections and uploads, serve until ctrl-c,
/// then close the storage client.
pub async fn handle() -> anyhow::Result<()> {
    let config = config();
    info!("Starting HR records API in {:?} mode", config.environment);

    let store = DocumentStore::connect(&config.database)
        .await
        .context("failed to connect document store")?;

    let result = serve(store.clone()).await;
    store.close().await;
    result
}

async fn serve(store: DocumentStore) -> anyhow::Result<()> {
    let config = config();

    let resources = resource_stores(&store);
    ensure_collections(&resources)
        .await
        .context("failed to prepare collections")?;

    let uploads = UploadStore::from_config(&config.uploads);
    uploads.prepare().await?;

    let app = build_app(config, store, resources, uploads);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("HR records API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
