//! Path management for Sikai
//!
//! ## Path Resolution Order
//!
//! 1. `SIKAI_DATA_DIR` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/sikai` (if set)
//! 3. The platform config directory from `directories`, e.g. `~/.config/sikai`

use directories::BaseDirs;
use std::path::{Path, PathBuf};

use crate::error::SikaiError;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "SIKAI_DATA_DIR";

/// Manages all paths used by Sikai
#[derive(Debug, Clone)]
pub struct SikaiPaths {
    base_dir: PathBuf,
}

impl SikaiPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, SikaiError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create SikaiPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    pub fn budgets_file(&self) -> PathBuf {
        self.data_dir().join("budgets.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), SikaiError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SikaiError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| SikaiError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, SikaiError> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("sikai"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("sikai"))
        .ok_or_else(|| SikaiError::Config("Could not determine home directory".into()))
}
