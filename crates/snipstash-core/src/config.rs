//! Server configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/snipstash/config.toml)
//! 3. Environment variables (SNIPSTASH_* prefix)
//!
//! Environment variables take precedence over config file values. Command
//! line flags are applied on top by the server binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "SNIPSTASH";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Socket address to listen on
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Number of request worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Log level for snipstash crates (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Value of the Access-Control-Allow-Origin header
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            workers: default_workers(),
            log_level: default_log_level(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config = Self::read_from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read file and environment values without validating them
    ///
    /// For callers that layer more overrides on top (command line flags)
    /// and validate the final result themselves.
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // SNIPSTASH_ADDR
        if let Ok(val) = std::env::var(format!("{}_ADDR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.addr = val;
            }
        }

        // SNIPSTASH_WORKERS
        if let Ok(val) = std::env::var(format!("{}_WORKERS", ENV_PREFIX)) {
            self.workers = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}_WORKERS: {:?}", ENV_PREFIX, val))?;
        }

        // SNIPSTASH_LOG_LEVEL
        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }

        // SNIPSTASH_CORS_ORIGIN
        if let Ok(val) = std::env::var(format!("{}_CORS_ORIGIN", ENV_PREFIX)) {
            if !val.is_empty() {
                self.cors_origin = val;
            }
        }

        Ok(())
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.addr.trim().is_empty() {
            anyhow::bail!("addr must not be empty");
        }
        if !self
            .cors_origin
            .bytes()
            .all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
        {
            anyhow::bail!("cors_origin must be printable ASCII: {:?}", self.cors_origin);
        }
        Ok(())
    }

    /// Replace the port of `addr`, keeping the host
    pub fn set_port(&mut self, port: u16) {
        let host = match self.addr.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.addr.clone(),
        };
        self.addr = format!("{}:{}", host, port);
    }

    /// Get the config file path
    ///
    /// Can be overridden with SNIPSTASH_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snipstash")
            .join("config.toml")
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}
