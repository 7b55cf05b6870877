//! Configuration for the RGS server.
//!
//! Centralized configuration with validation, defaults, and environment
//! variable support. Loaded once at startup and shared read-only through the
//! application context.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required field: {0}")]
    MissingRequired(String),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RgsConfig {
    /// Development mode: forces game availability and prefers emulator
    /// implementations during dispatch. Never enable in production.
    pub dev: bool,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

/// Integrity watchdog and lock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Explicit operator opt-out. When true the lock always reads unlocked
    /// and the watchdog is never started.
    pub disable_hash_verification: bool,
    /// Marker file whose presence means "locked".
    pub lock_marker: String,
    /// Files covered by the integrity hash, in hashing order.
    pub protected_files: Vec<String>,
    /// Trusted combined SHA-256 recorded at deployment (hex).
    pub baseline_hash: String,
    /// Watchdog cycle interval. 86400 = 24 hours.
    pub verify_interval_secs: u64,
}

impl Default for RgsConfig {
    fn default() -> Self {
        Self {
            dev: false,
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            disable_hash_verification: false,
            lock_marker: ".lock".to_string(),
            protected_files: vec![],
            baseline_hash: String::new(),
            verify_interval_secs: 86_400,
        }
    }
}

/// Configuration loader with environment variable support.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables.
    pub fn load(&self) -> Result<RgsConfig, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            RgsConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    /// Load without validation. Used by operator tooling (the `baseline`
    /// subcommand) that must run before a baseline hash has been recorded.
    pub fn load_lenient(&self) -> Result<RgsConfig, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            RgsConfig::default()
        };
        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<RgsConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut RgsConfig) -> Result<(), ConfigError> {
        if let Ok(dev) = env::var("RGS_DEV") {
            config.dev = dev.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RGS_DEV".to_string(),
                value: dev,
                reason: "Invalid boolean value".to_string(),
            })?;
        }
        if let Ok(addr) = env::var("RGS_LISTEN_ADDRESS") {
            config.server.listen_address = addr;
        }
        if let Ok(port) = env::var("RGS_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RGS_PORT".to_string(),
                value: port,
                reason: "Invalid port number".to_string(),
            })?;
        }
        if let Ok(disabled) = env::var("RGS_DISABLE_HASH_VERIFICATION") {
            config.security.disable_hash_verification =
                disabled.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "RGS_DISABLE_HASH_VERIFICATION".to_string(),
                    value: disabled,
                    reason: "Invalid boolean value".to_string(),
                })?;
        }
        if let Ok(marker) = env::var("RGS_LOCK_MARKER") {
            config.security.lock_marker = marker;
        }

        Ok(())
    }

    /// Validate configuration values.
    fn validate(&self, config: &RgsConfig) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if config.security.lock_marker.is_empty() {
            return Err(ConfigError::MissingRequired(
                "security.lock_marker".to_string(),
            ));
        }

        // The watchdog only makes sense with files to hash and a baseline to
        // compare against.
        if !config.security.disable_hash_verification {
            if config.security.protected_files.is_empty() {
                return Err(ConfigError::MissingRequired(
                    "security.protected_files".to_string(),
                ));
            }
            if config.security.baseline_hash.is_empty() {
                return Err(ConfigError::MissingRequired(
                    "security.baseline_hash".to_string(),
                ));
            }
            if config.security.verify_interval_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "security.verify_interval_secs".to_string(),
                    value: "0".to_string(),
                    reason: "Interval cannot be zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
