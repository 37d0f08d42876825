// src/main.rs
// =============================================================================
// This is the entry point of the link-sentinel service.
//
// What happens here:
// 1. Parse command-line flags using clap
// 2. Set up logging
// 3. Create the job store and the HTTP API on top of it
// 4. Serve until Ctrl-C / SIGTERM, then shut down gracefully
// =============================================================================

// Module declarations - tells Rust about our other source files
mod api;      // src/api/ - HTTP routes and handlers
mod checker;  // src/checker/ - URL validation, link extraction, link checks
mod cli;      // src/cli.rs - command-line parsing
mod job;      // src/job/ - job model and the worker that runs it
mod logging;  // src/logging.rs - tracing subscriber setup
mod store;    // src/store/ - where job results live

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::sync::Arc;
use store::{JobStore, MemoryStore};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());
    let app = api::router(api::AppState::new(store, cli.max_concurrent_checks));

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;

    match cli.max_concurrent_checks {
        Some(cap) => info!("link-sentinel listening on http://{} (max {cap} checks per job)", cli.listen),
        None => info!("link-sentinel listening on http://{}", cli.listen),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("link-sentinel stopped");
    Ok(())
}

// Resolves when the process is asked to stop
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
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
                error!("failed to listen for SIGTERM: {e}");
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

    info!("shutdown signal received");
}
