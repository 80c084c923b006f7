//! ==============================================================================
//! config.rs - runtime configuration loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `coopwatch.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - BackendConfig: base URL of the remote control backend.
//!     - PollingConfig: latest/history fetch intervals and staleness cutoff.
//!     - WasherConfig: pressure washer cycle length.
//!     - ServerConfig: local dashboard listen address.
//!     - LoggingConfig: tracing filter level.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::Path;

/// root configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub washer: WasherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// base URL of the poultry backend, no trailing slash
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub latest_interval_seconds: u64,
    pub history_interval_seconds: u64,
    /// readings older than this are rendered as "No recent data"
    pub stale_after_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WasherConfig {
    pub cycle_seconds: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl ConsoleConfig {
    /// load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: ConsoleConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("coopwatch.toml"),
            std::path::PathBuf::from("config").join("coopwatch.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] warning: failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] warning: no config file found - using defaults");
        Self::default()
    }

    /// print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────────┐");
        println!("│            CONSOLE CONFIGURATION            │");
        println!("├─────────────────────────────────────────────┤");
        println!("│ Backend: {}", self.backend.base_url);
        println!("│ Listen:  {}", self.server.listen_addr);
        println!(
            "│ Polling: latest {}s / history {}s / stale >{}s",
            self.polling.latest_interval_seconds,
            self.polling.history_interval_seconds,
            self.polling.stale_after_seconds
        );
        println!("│ Washer cycle: {}s", self.washer.cycle_seconds);
        println!("└─────────────────────────────────────────────┘");
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://127.0.0.1:8080".to_string(),
            },
            polling: PollingConfig::default(),
            washer: WasherConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            latest_interval_seconds: 30,
            history_interval_seconds: 300,
            stale_after_seconds: crate::status::STALE_AFTER_SECS,
        }
    }
}

impl Default for WasherConfig {
    fn default() -> Self {
        Self { cycle_seconds: 45 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_only_needs_the_backend_url() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [backend]
            base_url = "https://poultry-backend.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "https://poultry-backend.example.com");
        assert_eq!(config.polling.latest_interval_seconds, 30);
        assert_eq!(config.polling.history_interval_seconds, 300);
        assert_eq!(config.washer.cycle_seconds, 45);
    }

    #[test]
    fn overrides_are_honored() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://10.0.0.5:8080"

            [polling]
            latest_interval_seconds = 10
            history_interval_seconds = 120
            stale_after_seconds = 30

            [washer]
            cycle_seconds = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.polling.latest_interval_seconds, 10);
        assert_eq!(config.polling.stale_after_seconds, 30);
        assert_eq!(config.washer.cycle_seconds, 60);
    }
}
