//! Platform-specific directory management
//!
//! Provides the platform-specific config directory.
//! Follows XDG Base Directory Specification on Linux and standard locations on macOS.
//!
//! The `FILEPATH_CONFIG_DIR` environment variable overrides the default.

use std::env;
use std::path::PathBuf;

use crate::config::defaults::CONFIG_FILE_NAME;

/// Environment variable name for the config directory override
pub const ENV_CONFIG_DIR: &str = "FILEPATH_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "filepath";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct FilepathDirs {
    config_dir: PathBuf,
}

impl FilepathDirs {
    /// Create a new `FilepathDirs` instance
    ///
    /// Checks the environment variable first, then falls back to the platform default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/filepath` or `~/.config/filepath`
    /// - macOS: `~/Library/Application Support/filepath`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for FilepathDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_new_creates_instance() {
        let dirs = FilepathDirs::new();
        assert!(!dirs.config_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_global_config_path_is_under_config_dir() {
        let dirs = FilepathDirs::new();
        assert!(dirs.global_config_path().starts_with(dirs.config_dir()));
        assert!(dirs.global_config_path().ends_with("config.toml"));
    }
}
