//! ==============================================================================
//! backend.rs - remote backend HTTP client
//! ==============================================================================
//!
//! purpose:
//!     thin reqwest client over the poultry backend's REST contract:
//!     - GET  /api/sensors/latest            latest reading (404 = none yet)
//!     - GET  /api/sensors/history?limit=24  hourly trend window
//!     - POST /api/control                   forced-mode override command
//!
//! the actual control logic (PID loops, threshold enforcement) lives behind
//! this contract on the backend; the console only reads state and forwards
//! operator overrides. commands are sent exactly once, never retried.
//!
//! ==============================================================================

use crate::domain::{ControlCommand, HistoryPoint, SensorReading};
use thiserror::Error;

/// samples in the trend window requested from the backend
pub const HISTORY_LIMIT: u32 = 24;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// non-success status; carries the response body so the operator sees
    /// the backend's own message (e.g. "device busy")
    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// fetch the latest reading; Ok(None) on 404 (no reading exists yet)
    pub async fn fetch_latest(&self) -> Result<Option<SensorReading>, BackendError> {
        let url = format!("{}/api/sensors/latest", self.base_url);
        let res = self.http.get(&url).send().await?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = Self::check_status(res).await?;
        Ok(Some(res.json().await?))
    }

    /// fetch the 24-point hourly history, oldest first
    pub async fn fetch_history(&self) -> Result<Vec<HistoryPoint>, BackendError> {
        let url = format!("{}/api/sensors/history", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[("limit", HISTORY_LIMIT)])
            .send()
            .await?;
        let res = Self::check_status(res).await?;
        Ok(res.json().await?)
    }

    /// send one override command; returns the backend's acknowledgement
    pub async fn send_control(
        &self,
        command: &ControlCommand,
    ) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/api/control", self.base_url);
        let res = self.http.post(&url).json(command).send().await?;
        let res = Self::check_status(res).await?;
        Ok(res.json().await?)
    }

    /// turn a non-success response into an error carrying the body text
    async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(BackendError::Status { status, body })
        }
    }
}
