//! Mesh Cache - a distributed key/value cache for gateway clusters
//!
//! Runs one datastore node: a local TTL store behind the peer wire
//! protocol, replicating client writes to the peers responsible for
//! each key.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mesh_cache::api::{create_router, AppState};
use mesh_cache::cache::CacheStore;
use mesh_cache::config::Config;
use mesh_cache::datastore::Datastore;
use mesh_cache::remote::HttpProxyTransport;
use mesh_cache::tasks::spawn_cleanup_task;

/// Main entry point for a Mesh Cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the local store and the datastore facade
/// 4. Start the background TTL sweep task
/// 5. Create the Axum router with all endpoints
/// 6. Start the HTTP server on the configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mesh_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mesh Cache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, peers={}, replication_factor={}, quorum={}, per_call_timeout={}ms",
        config.server_port,
        config.peers.len(),
        config.replication_factor,
        config.quorum_size,
        config.per_call_timeout_ms
    );
    if config.peers.is_empty() {
        warn!("No cluster peers configured; remote operations will fail until CLUSTER_PEERS is set");
    }

    let local = Arc::new(RwLock::new(CacheStore::new(
        config.max_entries,
        config.default_ttl,
    )));
    let membership = Arc::new(RwLock::new(config.peers.clone()));
    let transport = Arc::new(HttpProxyTransport::new(Duration::from_millis(
        config.per_call_timeout_ms,
    )));
    let datastore = Arc::new(Datastore::new(
        Arc::clone(&local),
        Arc::clone(&membership),
        transport,
        &config,
    ));
    info!("Datastore initialized");

    let cleanup_handle = spawn_cleanup_task(local, config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(AppState::new(datastore, membership));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Node listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("Server error")?;

    info!("Node shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
