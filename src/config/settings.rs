//! User settings for Sikai
//!
//! Display preferences and the default user whose records are reported on.

use serde::{Deserialize, Serialize};

use super::paths::SikaiPaths;
use crate::error::SikaiError;
use crate::models::UserId;

/// User settings for Sikai
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// User reported on when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Prefix for weekly flow buckets ("Week 1", "Week 2", ...)
    #[serde(default = "default_week_label")]
    pub week_label: String,

    /// Name of the expense slice holding transactions without a category
    #[serde(default = "default_uncategorized_label")]
    pub uncategorized_label: String,

    /// Show flow buckets in calendar order instead of first-seen order
    #[serde(default)]
    pub calendar_order: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_week_label() -> String {
    "Week".to_string()
}

fn default_uncategorized_label() -> String {
    "Uncategorized".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            user_id: None,
            currency_symbol: default_currency(),
            week_label: default_week_label(),
            uncategorized_label: default_uncategorized_label(),
            calendar_order: false,
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &SikaiPaths) -> Result<Self, SikaiError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| SikaiError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| SikaiError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SikaiPaths) -> Result<(), SikaiError> {
        self.validate()?;
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SikaiError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| SikaiError::Io(format!("Failed to write settings file: {}", e)))?;

        tracing::debug!(path = %paths.settings_file().display(), "settings saved");
        Ok(())
    }

    fn validate(&self) -> Result<(), SikaiError> {
        if self.week_label.trim().is_empty() {
            return Err(SikaiError::Config("week_label cannot be empty".into()));
        }
        if self.uncategorized_label.trim().is_empty() {
            return Err(SikaiError::Config("uncategorized_label cannot be empty".into()));
        }
        Ok(())
    }
}
