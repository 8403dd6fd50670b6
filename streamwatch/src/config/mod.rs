//! Application configuration loading.
//!
//! Configuration comes from a JSON file (every section optional, with
//! defaults) plus a small set of environment overrides applied after the file
//! is parsed. The resulting [`AppConfig`] is immutable for the process
//! lifetime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::StreamDefinition;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/streamwatch.json";

/// Environment variable pointing at an alternative config file.
pub const ENV_CONFIG_PATH: &str = "STREAMWATCH_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub metrics: MetricsConfig,
    pub log: LogConfig,
    pub streams: Vec<StreamDefinition>,
}

/// API server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Check cadence and probe bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between full sweeps.
    pub check_interval_secs: u64,
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
    /// Reserved. Parsed and carried but not consulted by the checking logic.
    pub retry_attempts: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            timeout_secs: 5,
            retry_attempts: 3,
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prometheus exposition listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

/// Console log rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging settings. `RUST_LOG` overrides `filter` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
    /// When set, a daily-rolling log file is written under this directory.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: crate::logging::DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Text,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from `path`, then apply environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config file {}: {e}", path.display()))
        })?;

        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("Invalid config file {}: {e}", path.display())))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from the path in `STREAMWATCH_CONFIG`, falling back to
    /// [`DEFAULT_CONFIG_PATH`].
    pub fn load_from_env() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Environment overrides for the knobs that differ between deployments.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("STREAMWATCH_HOST")
            && !host.trim().is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("STREAMWATCH_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            self.server.port = parsed;
        }

        if let Ok(port) = std::env::var("STREAMWATCH_METRICS_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            self.metrics.port = parsed;
        }

        if let Ok(filter) = std::env::var("STREAMWATCH_LOG_FILTER")
            && !filter.trim().is_empty()
        {
            self.log.filter = filter;
        }
    }

    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.check_interval_secs == 0 {
            return Err(Error::validation("monitor.check_interval_secs must be > 0"));
        }
        if self.monitor.timeout_secs == 0 {
            return Err(Error::validation("monitor.timeout_secs must be > 0"));
        }

        let mut seen = std::collections::HashSet::new();
        for stream in &self.streams {
            if stream.id.trim().is_empty() {
                return Err(Error::validation("stream id must not be empty"));
            }
            if stream.url.trim().is_empty() {
                return Err(Error::validation(format!(
                    "stream {} has an empty url",
                    stream.id
                )));
            }
            if !seen.insert(stream.id.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate stream id: {}",
                    stream.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.enable_cors);
        assert_eq!(config.monitor.check_interval_secs, 30);
        assert_eq!(config.monitor.timeout_secs, 5);
        assert_eq!(config.monitor.retry_attempts, 3);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9090);
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.streams.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_parses() {
        let raw = r#"{
            "server":  { "host": "127.0.0.1", "port": 9999, "enable_cors": false },
            "monitor": { "check_interval_secs": 10, "timeout_secs": 2, "retry_attempts": 0 },
            "metrics": { "enabled": false, "host": "127.0.0.1", "port": 9100 },
            "log":     { "filter": "debug", "format": "json", "dir": "/var/log/streamwatch" },
            "streams": [
                { "id": "cam1", "name": "Camera 1", "url": "http://cam1.local/stream" },
                { "id": "cam2", "name": "Camera 2", "url": "http://cam2.local/stream" }
            ]
        }"#;

        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.server.enable_cors);
        assert_eq!(config.monitor.check_interval(), Duration::from_secs(10));
        assert_eq!(config.monitor.timeout(), Duration::from_secs(2));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.streams[1].id, "cam2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_stream_ids_rejected() {
        let raw = r#"{
            "streams": [
                { "id": "cam1", "name": "A", "url": "http://a/" },
                { "id": "cam1", "name": "B", "url": "http://b/" }
            ]
        }"#;

        let config: AppConfig = serde_json::from_str(raw).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate stream id"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let raw = r#"{ "monitor": { "check_interval_secs": 0 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let raw = r#"{ "monitor": { "timeout_secs": 0 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_stream_url_rejected() {
        let raw = r#"{ "streams": [ { "id": "cam1", "name": "A", "url": " " } ] }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }
}
