//! Configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use merkledrop_core::{DuplicatePolicy, HashAlgorithm};

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Tree construction
    #[serde(default)]
    pub tree: TreeSettings,

    /// Balance aggregation
    #[serde(default)]
    pub aggregation: AggregationSettings,

    /// Descriptor output
    #[serde(default)]
    pub output: OutputSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let settings: Settings = serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            info!("Loaded settings from {:?}", path);
            settings
        } else {
            Self::default()
        };
        settings.config_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Path these settings were loaded from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Tree settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSettings {
    /// Digest for leaves and nodes
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Extract claim proofs concurrently
    #[serde(default = "default_true")]
    pub parallel_proofs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            parallel_proofs: true,
        }
    }
}

/// Aggregation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationSettings {
    /// Repeated recipients in list input: sum or reject
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print descriptor JSON
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Prefix hex digests with 0x
    #[serde(default)]
    pub hex_prefix: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty: true,
            hex_prefix: false,
        }
    }
}
