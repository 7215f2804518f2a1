//! Path utilities for cross-platform support

use std::path::{Path, PathBuf};

/// Expand a path, replacing a leading `~` with the user's home directory
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

/// Get the default config directory for the current platform
///
/// - macOS: `~/Library/Application Support/Merkledrop`
/// - Linux: `~/.config/merkledrop`
/// - Windows: `%APPDATA%\Merkledrop`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .map(|h| h.join("Library/Application Support/Merkledrop"))
            .unwrap_or_else(|| PathBuf::from(".merkledrop"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|d| PathBuf::from(d).join("Merkledrop"))
            .unwrap_or_else(|| PathBuf::from(".merkledrop"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".config")))
            .map(|d| d.join("merkledrop"))
            .unwrap_or_else(|| PathBuf::from(".merkledrop"))
    }
}
