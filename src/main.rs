//! Portfolio Cache - position service binary
//!
//! Uses Redis when `REDIS_URL` is set, otherwise an in-process store with a
//! background sweep of expired keys.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_cache::api::create_router;
use portfolio_cache::cache::{KvStore, MemoryStore, RedisStore};
use portfolio_cache::{spawn_cleanup_task, AppState, Config};

/// Main entry point for the position service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the key-value backend
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting portfolio position service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: env={}, port={}, position_ttl={}s (+{}s jitter), client_list_ttl={}s, rate_limit={}/{}s",
        config.environment,
        config.server_port,
        config.position_ttl,
        config.position_ttl_jitter,
        config.client_list_ttl,
        config.rate_limit_max,
        config.rate_limit_window
    );

    let (store, backend, cleanup_handle) = connect_store(&config).await?;
    let state = AppState::new(store, &config, backend);
    info!(backend, "Key-value backend ready");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn connect_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn KvStore>, &'static str, Option<JoinHandle<()>>)> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .with_context(|| format!("failed to connect to Redis at {}", url))?;
            Ok((Arc::new(store), "redis", None))
        }
        None => {
            let store = MemoryStore::new();
            let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
            info!("Background cleanup task started");
            Ok((Arc::new(store), "memory", Some(handle)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
