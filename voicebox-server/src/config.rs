// Server configuration: defaults, config file, environment, then CLI flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use voicebox_spk::SpeechConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// HTTP listener and logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub bind_port: u16,
    /// Path of the text-to-speech endpoint
    pub api_path: String,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 8080,
            api_path: "/text_to_speech/api_v1".to_string(),
            cors_origins: Vec::new(),
            max_request_size: 64 * 1024,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Complete voicebox configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub speech: SpeechConfig,
}

impl ServerConfig {
    /// Load configuration from file; the format follows the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string())),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string())),
            _ => Self::from_str(&content),
        }
    }

    /// Load configuration from string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        // Try JSON first
        if let Ok(config) = serde_json::from_str::<ServerConfig>(content) {
            return Ok(config);
        }

        // Try TOML
        if let Ok(config) = toml::from_str::<ServerConfig>(content) {
            return Ok(config);
        }

        // Try YAML
        if let Ok(config) = serde_yaml::from_str::<ServerConfig>(content) {
            return Ok(config);
        }

        Err(ConfigError::ParseError("Unknown format".to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` as the environment
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("VOICEBOX_HOST") {
            self.network.bind_address = host;
        }

        if let Some(port) = lookup("VOICEBOX_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.network.bind_port = p,
                Err(_) => tracing::warn!("Ignoring invalid VOICEBOX_PORT '{}'", port),
            }
        }

        if let Some(dir) = lookup("VOICEBOX_CACHE_DIR") {
            self.speech.cache_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("VOICEBOX_LOG_LEVEL") {
            self.network.log_level = level;
        }

        if let Some(key) = lookup("GOOGLE_CLOUD_API_KEY") {
            if !key.is_empty() {
                self.speech.api.api_key = Some(key);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.bind_address.is_empty() {
            return Err(ConfigError::ValidationError("bind_address cannot be empty".to_string()));
        }

        let api_path = &self.network.api_path;
        if !api_path.starts_with('/') || api_path.len() < 2 {
            return Err(ConfigError::ValidationError(
                "api_path must start with '/' and not be the root".to_string(),
            ));
        }

        if api_path.contains(':') || api_path.contains('*') {
            return Err(ConfigError::ValidationError(
                "api_path cannot contain route parameters".to_string(),
            ));
        }

        if api_path.trim_end_matches('/') == crate::http::HEALTH_PATH {
            return Err(ConfigError::ValidationError(format!(
                "api_path cannot be {}",
                crate::http::HEALTH_PATH
            )));
        }

        let files_prefix = self.speech.url_prefix.trim_end_matches('/');
        if api_path.trim_end_matches('/') == files_prefix {
            return Err(ConfigError::ValidationError(
                "api_path and url_prefix must differ".to_string(),
            ));
        }

        if self.network.max_request_size == 0 {
            return Err(ConfigError::ValidationError("max_request_size must be > 0".to_string()));
        }

        for origin in &self.network.cors_origins {
            url::Url::parse(origin).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid CORS origin '{}': {}", origin, e))
            })?;
        }

        if self.network.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError("log_level cannot be empty".to_string()));
        }

        self.speech.validate().map_err(ConfigError::ValidationError)?;

        Ok(())
    }
}
