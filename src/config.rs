//! Client configuration
//!
//! Plain settings shared by every call issued through one client. Can be
//! built in code, read from TOML (`~/.ollamapipe/config.toml` by default) or
//! taken from the environment.

use crate::errors::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default timeout for non-streaming requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for streaming requests (seconds)
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 60;

/// Default number of retries after the first attempt
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff factor (seconds)
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;

/// Configuration for `OllamaClient`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub stream_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Parameters applied to every generation unless the call overrides them
    pub default_parameters: Map<String, Value>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stream_timeout_secs: DEFAULT_STREAM_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_factor: DEFAULT_BACKOFF_FACTOR,
            default_model: None,
            default_parameters: Map::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables on top of defaults.
    ///
    /// - `OLLAMA_BASE_URL` or `OLLAMA_HOST`: base URL
    /// - `OLLAMA_TIMEOUT_SECS`: request timeout
    /// - `OLLAMA_STREAM_TIMEOUT_SECS`: stream timeout
    /// - `OLLAMA_MODEL`: default model
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("OLLAMA_BASE_URL").or_else(|_| std::env::var("OLLAMA_HOST")) {
            config.base_url = url;
        }
        if let Some(secs) = env_u64("OLLAMA_TIMEOUT_SECS")? {
            config.timeout_secs = secs;
        }
        if let Some(secs) = env_u64("OLLAMA_STREAM_TIMEOUT_SECS")? {
            config.stream_timeout_secs = secs;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.default_model = Some(model);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read config: {}", e)))?;

        let config: ClientConfig = toml::from_str(&contents)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `~/.ollamapipe/config.toml` if present, otherwise defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ollamapipe").join("config.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClientError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 || self.stream_timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if !self.retry_backoff_factor.is_finite() || self.retry_backoff_factor < 0.0 {
            return Err(ClientError::Config(
                "retry_backoff_factor must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL without trailing separators
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn with_stream_timeout(mut self, seconds: u64) -> Self {
        self.stream_timeout_secs = seconds;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_backoff_factor(mut self, factor: f64) -> Self {
        self.retry_backoff_factor = factor;
        self
    }

    pub fn with_default_model<S: Into<String>>(mut self, model: S) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_default_parameter<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.default_parameters.insert(key.into(), value);
        self
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::Config(format!("{} must be an integer, got '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
