//! Configuration module for Sikai
//!
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::SikaiPaths;
pub use settings::Settings;
