//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for doc-insight
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend endpoint configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API (the `/chat` and `/set-api-key`
    /// endpoints hang off this)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name under which the session credential is registered with the
    /// backend
    #[serde(default = "default_key_name")]
    pub key_name: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_key_name() -> String {
    "my_llm_key".to_string()
}

fn default_timeout_s() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            key_name: default_key_name(),
            timeout_s: default_timeout_s(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
