//! SessionHub Server: multi-device session management.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use sessionhub_api::{AppState, build_router};
use sessionhub_core::config::AppConfig;
use sessionhub_core::traits::SystemClock;
use sessionhub_database::Backends;
use sessionhub_worker::WorkerRunner;

#[tokio::main]
async fn main() {
    let env = std::env::var("SESSIONHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting SessionHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Persistence ──────────────────────────────────────
    let backends = Backends::connect(&config.database)
        .await
        .context("Failed to initialize persistence")?;

    // ── Step 2: Application state ────────────────────────────────
    let addr = config.server.bind_addr();
    let grace = config.server.shutdown_grace;
    let state = AppState::new(config, backends, Arc::new(SystemClock));

    // ── Step 3: Background work ──────────────────────────────────
    let cancel = CancellationToken::new();
    let workers = WorkerRunner::start(state.sweeper(), state.heartbeat_job(), cancel);
    tracing::info!("Background workers started");

    // ── Step 4: HTTP server ──────────────────────────────────────
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("SessionHub server listening on {addr}");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    })
    .await;

    // ── Step 5: Wind down ────────────────────────────────────────
    state.realtime.shutdown();
    workers.shutdown(grace).await;
    if let Some(pool) = &state.db_pool {
        pool.close().await;
    }

    served.context("Server error")?;
    tracing::info!("SessionHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
