//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! nightscout-config.toml file: which Nightscout site to talk to, the API
//! secret, and the limits applied to queries.

use crate::transport::DEFAULT_TIMEOUT_SECS;
use crate::window::{effective_span, DEFAULT_MAX_SPAN_DAYS};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file name, relative to the working directory.
pub const CONFIG_FILE: &str = "nightscout-config.toml";

/// Application configuration loaded from nightscout-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Nightscout site configuration
    pub server: ServerConfig,
    /// Query limits
    #[serde(default)]
    pub query: QueryConfig,
}

/// Nightscout site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Base URL of the site (e.g., "https://my-site.herokuapp.com")
    pub url: String,
    /// API secret in plain text; only its SHA-1 digest is sent
    pub secret: String,
}

/// Limits applied to every query
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Widest range requested from the entries endpoint in one call; values
    /// outside `1..=7` are treated as 7
    pub max_window_days: i64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// `count` sent to the entries endpoint
    pub entries_count: u32,
    /// `count` sent to the treatments endpoint
    pub treatments_count: u32,
    /// `count` sent to the device status endpoint
    pub device_status_count: u32,
    /// Drop glucose readings repeated at window boundaries
    pub dedupe_boundary_readings: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            max_window_days: DEFAULT_MAX_SPAN_DAYS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            entries_count: 100_000,
            treatments_count: 1_000,
            device_status_count: 100_000,
            dedupe_boundary_readings: false,
        }
    }
}

impl QueryConfig {
    /// Maximum window as a duration, never wider than 7 days.
    pub fn max_window(&self) -> Duration {
        let requested = Duration::try_days(self.max_window_days).unwrap_or(Duration::zero());
        effective_span(requested)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                url: "http://localhost:1337".to_string(),
                secret: String::new(),
            },
            query: QueryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from nightscout-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(url = %config.server.url, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to nightscout-config.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:1337");
        assert_eq!(config.query.max_window_days, 7);
        assert_eq!(config.query.request_timeout_secs, 60);
        assert_eq!(config.query.entries_count, 100_000);
        assert_eq!(config.query.treatments_count, 1_000);
        assert!(!config.query.dedupe_boundary_readings);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.url, parsed.server.url);
        assert_eq!(config.query, parsed.query);
    }

    #[test]
    fn test_partial_query_section_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [server]
            url = "https://example.herokuapp.com"
            secret = "RS89JLJ9A6YR"

            [query]
            max_window_days = 3
            "#,
        )
        .unwrap();

        assert_eq!(parsed.query.max_window_days, 3);
        assert_eq!(parsed.query.request_timeout_secs, 60);
        assert_eq!(parsed.query.max_window(), Duration::days(3));
    }

    #[test]
    fn test_max_window_is_capped() {
        let mut query = QueryConfig::default();
        for days in [0, -5, 8, 30, i64::MAX, i64::MIN] {
            query.max_window_days = days;
            assert_eq!(query.max_window(), Duration::days(7), "max_window_days = {days}");
        }
        query.max_window_days = 1;
        assert_eq!(query.max_window(), Duration::days(1));
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.server.url = "https://example.herokuapp.com".to_string();
        config.query.dedupe_boundary_readings = true;

        config.save_to_path(temp_file.path()).unwrap();
        let loaded = Config::load_from_path(temp_file.path());

        assert_eq!(loaded.server.url, "https://example.herokuapp.com");
        assert!(loaded.query.dedupe_boundary_readings);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.server.url, "http://localhost:1337");
    }
}
