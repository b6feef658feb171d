//! Global configuration management
//!
//! Reads settings from `config.toml` in the config directory: the identity
//! ceiling used to spot misread negative ids, and output preferences.

use crate::config::defaults::DEFAULT_MAXIMUM_UID;
use crate::infra::dirs::FilepathDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for filepath
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Identity resolution settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Identity resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Highest uid/gid treated as valid
    pub maximum_uid: Option<u32>,
}

/// Output preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable quiet mode
    pub quiet: Option<bool>,

    /// Enable JSON output
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &FilepathDirs) -> Result<Self, GlobalConfigError> {
        let config_path = dirs.global_config_path();
        Self::load_from_path(&config_path)
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Get the effective maximum uid/gid
    ///
    /// Returns the custom value if set, otherwise returns the default.
    #[must_use]
    pub fn maximum_uid(&self) -> u32 {
        self.identity.maximum_uid.unwrap_or(DEFAULT_MAXIMUM_UID)
    }
}
