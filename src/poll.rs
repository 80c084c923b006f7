//! ==============================================================================
//! poll.rs - backend polling schedules
//! ==============================================================================
//!
//! purpose:
//!     the three periodic tasks feeding the shared console state:
//!     - latest loop   (30s): live reading, drives the parameter cards
//!     - history loop  (5m):  24-point trend window for the charts
//!     - ticker        (1s):  staleness clock + washer cycle countdown
//!
//! each task only overwrites the state slice it owns, so the loops never
//! race each other. a failed latest fetch raises the visible error banner
//! and waits for the next scheduled attempt; a failed history fetch is
//! logged and otherwise ignored (the chart simply keeps its old series).
//!
//! ==============================================================================

use crate::backend::BackendClient;
use crate::control::Dispatcher;
use crate::domain::{ConsoleState, TrendSeries};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// fetch the latest reading immediately, then on the configured interval
pub async fn run_latest_loop(
    client: BackendClient,
    state: Arc<RwLock<ConsoleState>>,
    interval_seconds: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    loop {
        interval.tick().await;
        match client.fetch_latest().await {
            Ok(Some(reading)) => {
                tracing::debug!(created_at = ?reading.created_at, "latest reading updated");
                state.write().await.adopt_reading(reading, Utc::now());
            }
            Ok(None) => {
                // 404: the backend has no reading yet
                tracing::debug!("no reading available yet");
                state.write().await.clear_reading();
            }
            Err(e) => {
                tracing::warn!("latest reading fetch failed: {e}");
                state.write().await.fetch_error = Some(e.to_string());
            }
        }
    }
}

/// refresh the 24-hour trend window; failures leave the old series in place
pub async fn run_history_loop(
    client: BackendClient,
    state: Arc<RwLock<ConsoleState>>,
    interval_seconds: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    loop {
        interval.tick().await;
        match client.fetch_history().await {
            Ok(points) => {
                let trends = TrendSeries::from_history(&points);
                state.write().await.trends = trends;
            }
            Err(e) => {
                tracing::debug!("history fetch failed, keeping old series: {e}");
            }
        }
    }
}

/// 1-second ticker: recomputes reading age from the cached timestamp only
/// and advances the washer cycle
pub async fn run_ticker(state: Arc<RwLock<ConsoleState>>, dispatcher: Arc<Dispatcher>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        state.write().await.refresh_age(Utc::now());
        dispatcher.tick_washer().await;
    }
}
