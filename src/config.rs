use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::http::buffer::DEFAULT_MAX_CAPACITY;
use crate::http::state::Settings;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8443";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid log level: {0}")]
    LogLevel(String),
}

/// Controller settings.
///
/// Every field has a default, so an empty YAML file is a valid config:
///
/// ```yaml
/// listen_addr: 127.0.0.1:8443
/// read_buffer_size: 1024
/// max_buffer_size: 16777216
/// log_level: debug
/// timeouts:
///   header_read_secs: 60
///   body_read_secs: 60
///   write_secs: 60
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Initial per-connection read buffer. Request headers must fit in it.
    pub read_buffer_size: usize,
    /// Ceiling for the read buffer once it grows to hold a body.
    pub max_buffer_size: usize,
    pub log_level: String,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub header_read_secs: u64,
    pub body_read_secs: u64,
    pub write_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN.to_string(),
            read_buffer_size: 1024,
            max_buffer_size: DEFAULT_MAX_CAPACITY,
            log_level: "info".to_string(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            header_read_secs: 60,
            body_read_secs: 60,
            write_secs: 60,
        }
    }
}

impl Config {
    /// Loads the file named by `CONTROLLER_CONFIG`, if set, then applies the
    /// `LISTEN` override.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("CONTROLLER_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn connection_settings(&self) -> Settings {
        Settings {
            read_buffer_size: self.read_buffer_size,
            max_buffer_size: self.max_buffer_size,
            header_timeout: Duration::from_secs(self.timeouts.header_read_secs),
            body_timeout: Duration::from_secs(self.timeouts.body_read_secs),
            write_timeout: Duration::from_secs(self.timeouts.write_secs),
        }
    }
}
