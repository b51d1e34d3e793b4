//! Configuration management for ChatRPC
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest first: built-in defaults, YAML file, `CHATRPC_*`
//! environment variables, command-line flags.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChatRpcError, Result};
use crate::session::ControllerOptions;

/// Main configuration structure for ChatRPC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where and how to reach the JSON-RPC backend
    #[serde(default)]
    pub service: ServiceConfig,
    /// Session controller behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// Tool-server registry behaviour
    #[serde(default)]
    pub servers: ServersConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// JSON-RPC endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_endpoint() -> String {
    "http://localhost:8000/api/v1/jsonrpc".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_seconds: default_request_timeout(),
            headers: HashMap::new(),
        }
    }
}

/// Session controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time before the advisory timeout flag flips, in milliseconds
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_ms: u64,

    /// Title for sessions created without one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Leading messages sent to title generation
    #[serde(default = "default_title_context")]
    pub title_context_messages: usize,

    /// Messages required before a title can be generated
    #[serde(default = "default_title_min")]
    pub title_min_messages: usize,
}

fn default_inactivity_timeout() -> u64 {
    300_000
}

fn default_title() -> String {
    "New Session".to_string()
}

fn default_title_context() -> usize {
    10
}

fn default_title_min() -> usize {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: default_inactivity_timeout(),
            default_title: default_title(),
            title_context_messages: default_title_context(),
            title_min_messages: default_title_min(),
        }
    }
}

impl From<&SessionConfig> for ControllerOptions {
    fn from(config: &SessionConfig) -> Self {
        ControllerOptions {
            default_title: config.default_title.clone(),
            inactivity_window: Duration::from_millis(config.inactivity_timeout_ms),
            title_context_messages: config.title_context_messages,
            title_min_messages: config.title_min_messages,
        }
    }
}

/// Tool-server registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServersConfig {
    /// Interval of the periodic status check in minutes
    #[serde(default = "default_status_check")]
    pub status_check_interval_minutes: u64,
}

fn default_status_check() -> u64 {
    15
}

impl Default for ServersConfig {
    fn default() -> Self {
        Self {
            status_check_interval_minutes: default_status_check(),
        }
    }
}

impl ServersConfig {
    /// The check interval as a `Duration`.
    pub fn status_check_interval(&self) -> Duration {
        Duration::from_secs(self.status_check_interval_minutes * 60)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatRpcError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatRpcError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(endpoint) = std::env::var("CHATRPC_ENDPOINT") {
            self.service.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("CHATRPC_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATRPC_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(window) = std::env::var("CHATRPC_INACTIVITY_TIMEOUT_MS") {
            if let Ok(value) = window.parse() {
                self.session.inactivity_timeout_ms = value;
            } else {
                tracing::warn!("Invalid CHATRPC_INACTIVITY_TIMEOUT_MS: {}", window);
            }
        }

        if let Ok(title) = std::env::var("CHATRPC_DEFAULT_TITLE") {
            self.session.default_title = title;
        }

        if let Ok(minutes) = std::env::var("CHATRPC_STATUS_CHECK_MINUTES") {
            if let Ok(value) = minutes.parse() {
                self.servers.status_check_interval_minutes = value;
            } else {
                tracing::warn!("Invalid CHATRPC_STATUS_CHECK_MINUTES: {}", minutes);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(endpoint) = &cli.endpoint {
            tracing::debug!("Using endpoint override: {}", endpoint);
            self.service.endpoint = endpoint.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Parsed endpoint URL
    ///
    /// # Errors
    ///
    /// Returns a config error if the endpoint is not a valid http(s) URL
    pub fn endpoint_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(&self.service.endpoint).map_err(|e| {
            ChatRpcError::Config(format!(
                "Invalid service.endpoint '{}': {}",
                self.service.endpoint, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatRpcError::Config(format!(
                "service.endpoint must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }
        Ok(url)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;

        if self.service.request_timeout_seconds == 0 {
            return Err(ChatRpcError::Config(
                "service.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.inactivity_timeout_ms == 0 {
            return Err(ChatRpcError::Config(
                "session.inactivity_timeout_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.default_title.trim().is_empty() {
            return Err(ChatRpcError::Config(
                "session.default_title cannot be empty".to_string(),
            )
            .into());
        }

        if self.session.title_context_messages == 0 {
            return Err(ChatRpcError::Config(
                "session.title_context_messages must be at least 1".to_string(),
            )
            .into());
        }

        if self.session.title_min_messages == 0 {
            return Err(ChatRpcError::Config(
                "session.title_min_messages must be at least 1".to_string(),
            )
            .into());
        }

        if self.servers.status_check_interval_minutes == 0 {
            return Err(ChatRpcError::Config(
                "servers.status_check_interval_minutes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Options for a [`crate::session::SessionController`]
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions::from(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: [&str; 5] = [
        "CHATRPC_ENDPOINT",
        "CHATRPC_REQUEST_TIMEOUT_SECONDS",
        "CHATRPC_INACTIVITY_TIMEOUT_MS",
        "CHATRPC_DEFAULT_TITLE",
        "CHATRPC_STATUS_CHECK_MINUTES",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn cli(args: &[&str]) -> crate::cli::Cli {
        let mut full = vec!["chatrpc"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["sessions", "list"]);
        crate::cli::Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.endpoint, "http://localhost:8000/api/v1/jsonrpc");
        assert_eq!(config.service.request_timeout_seconds, 30);
        assert_eq!(config.session.inactivity_timeout_ms, 300_000);
        assert_eq!(config.session.default_title, "New Session");
        assert_eq!(config.servers.status_check_interval_minutes, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_controller_options_from_config() {
        let options = Config::default().controller_options();
        assert_eq!(options, ControllerOptions::default());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
service:
  endpoint: "https://chat.example.com/api/v1/jsonrpc"
  headers:
    Authorization: "Bearer abc"
session:
  inactivity_timeout_ms: 60000
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.service.endpoint, "https://chat.example.com/api/v1/jsonrpc");
        assert_eq!(config.service.request_timeout_seconds, 30);
        assert_eq!(config.service.headers["Authorization"], "Bearer abc");
        assert_eq!(config.session.inactivity_timeout_ms, 60_000);
        assert_eq!(config.session.title_context_messages, 10);
        assert_eq!(config.servers.status_check_interval_minutes, 15);
    }

    #[test]
    fn test_validation_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.service.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.service.endpoint = "ftp://example.com/rpc".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.service.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.title_min_messages = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.default_title = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("nonexistent.yaml", &cli(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_file_then_env_then_cli() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "service:\n  endpoint: http://file:8000/rpc\n  request_timeout_seconds: 5"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::load(&path, &cli(&[])).unwrap();
        assert_eq!(config.service.endpoint, "http://file:8000/rpc");
        assert_eq!(config.service.request_timeout_seconds, 5);

        std::env::set_var("CHATRPC_ENDPOINT", "http://env:8000/rpc");
        std::env::set_var("CHATRPC_INACTIVITY_TIMEOUT_MS", "1000");
        std::env::set_var("CHATRPC_STATUS_CHECK_MINUTES", "not-a-number");
        let config = Config::load(&path, &cli(&[])).unwrap();
        assert_eq!(config.service.endpoint, "http://env:8000/rpc");
        assert_eq!(config.session.inactivity_timeout_ms, 1000);
        assert_eq!(config.servers.status_check_interval_minutes, 15);

        let config = Config::load(&path, &cli(&["--endpoint", "http://cli:8000/rpc"])).unwrap();
        assert_eq!(config.service.endpoint, "http://cli:8000/rpc");

        clear_env();
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service: [not, a, map").unwrap();
        let err = Config::from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
