//! Merkledrop Settings
//!
//! Configuration for distribution generation.
//!
//! ## Features
//!
//! - Tree settings (hash algorithm, parallel proof extraction)
//! - Aggregation policy for repeated recipients
//! - Output formatting for the descriptor JSON
//! - Cross-platform config file storage
//!
//! ## Usage
//!
//! ```no_run
//! use merkledrop_settings::Settings;
//! use merkledrop_core::HashAlgorithm;
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.tree.hash_algorithm = HashAlgorithm::Sha256;
//! settings.save()?;
//! # Ok::<(), merkledrop_settings::SettingsError>(())
//! ```

mod config;
mod paths;

pub use config::{AggregationSettings, OutputSettings, Settings, TreeSettings};
pub use paths::{default_config_dir, expand_path};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
