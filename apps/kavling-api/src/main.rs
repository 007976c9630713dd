//! # Kavling API Server
//!
//! ```text
//! startup:  env config ─► load STORAGE_DIR ─► reconcile ledger ─► serve :16000
//!                              │
//!                              └─ load failure: serve anyway, data routes
//!                                 answer 503 until a restart finds the files
//! ```

use std::sync::Arc;

use anyhow::Context;
use kavling_api::config::ApiConfig;
use kavling_api::{build_router, AppState};
use kavling_store::{EntityStore, Repositories};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Kavling API server...");

    // Load configuration
    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        storage_dir = %config.storage_dir.display(),
        bind = %config.bind_addr,
        admin = !config.admin_token.is_empty(),
        "Configuration loaded"
    );
    if config.admin_token.is_empty() {
        warn!("ADMIN_TOKEN is not set, every admin route will answer 401");
    }

    // Load storage
    let store = Arc::new(EntityStore::open(&config.storage_dir));
    let loaded = {
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || store.load()).await?
    };
    match loaded {
        Ok(()) => info!("Storage loaded"),
        Err(e) => error!(error = %e, "Storage failed to load, serving as not ready"),
    }

    // Replay the payment ledger over plans and KPRs
    if config.reconcile_on_start && store.storage_ready() {
        let store = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || store.reconciler().run()).await? {
            Ok(summary) => info!(
                repaired_plans = summary.repaired_plans.len(),
                repaired_kprs = summary.repaired_kprs.len(),
                discrepancies = summary.discrepancies.len(),
                "Startup reconciliation complete"
            ),
            Err(e) => error!(error = %e, "Startup reconciliation failed"),
        }
    }

    let app = build_router(AppState::new(store, &config.admin_token));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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
