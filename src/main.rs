//! ==============================================================================
//! main.rs - coopwatch entry point
//! ==============================================================================
//!
//! purpose:
//!     operator console for a poultry-house environmental monitoring and
//!     control deployment. the actual control logic (PID loops, fan/light
//!     automation, threshold enforcement) runs on the remote backend; this
//!     console polls it, classifies the readings, serves the dashboard and
//!     forwards manual overrides.
//!
//! responsibilities:
//!     - load configuration (coopwatch.toml)
//!     - poll the backend for the latest reading (30s) and history (5m)
//!     - tick the staleness clock and the washer cycle (1s)
//!     - serve the dashboard + local control API
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                     coopwatch console                    │
//!     │  ┌────────────┐ ┌────────────┐ ┌───────────────────────┐ │
//!     │  │ latest     │ │ history    │ │ 1s ticker             │ │
//!     │  │ loop (30s) │ │ loop (5m)  │ │ (staleness + washer)  │ │
//!     │  └─────┬──────┘ └─────┬──────┘ └──────────┬────────────┘ │
//!     │        └──────────────┼───────────────────┘              │
//!     │                ┌──────┴───────┐     ┌─────────────┐      │
//!     │                │ ConsoleState │◄────┤ web server  │      │
//!     │                └──────┬───────┘     └──────┬──────┘      │
//!     │                       │ dispatcher         │             │
//!     └───────────────────────┼────────────────────┼─────────────┘
//!                             ▼                    ▼
//!                      remote backend       operator browser
//!                   (GET latest/history,
//!                      POST /api/control)
//!
//! ==============================================================================

mod backend;
mod config;
mod control;
mod domain;
mod poll;
mod render;
mod server;
mod shell;
mod status;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    println!("===========================================================");
    println!("  coopwatch - Poultry Monitoring & Control Console");
    println!("===========================================================");

    // step 1: load configuration
    let config = config::ConsoleConfig::load_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    config.print_summary();

    // step 2: shared state + backend client + dispatcher
    let state = Arc::new(RwLock::new(domain::ConsoleState {
        stale_after_secs: config.polling.stale_after_seconds,
        ..Default::default()
    }));
    let shell = Arc::new(RwLock::new(shell::Shell::default()));
    let client = backend::BackendClient::new(&config.backend.base_url);
    let dispatcher = Arc::new(control::Dispatcher::new(
        client.clone(),
        state.clone(),
        config.washer.cycle_seconds,
    ));

    // step 3: web server in the background
    let ctx = server::AppCtx {
        state: state.clone(),
        shell,
        dispatcher: dispatcher.clone(),
    };
    let listen_addr = config.server.listen_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = server::run(ctx, &listen_addr).await {
            tracing::error!("web server error: {e}");
        }
    });

    // step 4: polling schedules
    tokio::spawn(poll::run_history_loop(
        client.clone(),
        state.clone(),
        config.polling.history_interval_seconds,
    ));
    tokio::spawn(poll::run_ticker(state.clone(), dispatcher));

    tracing::info!(
        "starting sensor polling ({}s interval)",
        config.polling.latest_interval_seconds
    );
    poll::run_latest_loop(client, state, config.polling.latest_interval_seconds).await;
    Ok(())
}
