//! Custom error types for Sikai
//!
//! Only genuinely malformed input surfaces here. Structural problems in the
//! record set (orphaned references, cycles, duplicate budget rows) are
//! absorbed by the engine and reported as [`crate::engine::Anomaly`] values.

use thiserror::Error;

use crate::models::money::MoneyParseError;

/// The main error type for Sikai operations
#[derive(Error, Debug)]
pub enum SikaiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for input records
    #[error("Validation error: {0}")]
    Validation(String),

    /// An amount that could not be read as an exact decimal
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyParseError),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SikaiError {
    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidAmount(_))
    }
}

impl From<std::io::Error> for SikaiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SikaiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Sikai operations
pub type SikaiResult<T> = Result<T, SikaiError>;
