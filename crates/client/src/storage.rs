//! File-backed persistence for small JSON documents.
//!
//! Documents live in the platform-appropriate config directory unless an
//! explicit path is given:
//! - Linux: `~/.config/notiflow/`
//! - macOS: `~/Library/Application Support/notiflow/`
//! - Windows: `%APPDATA%\notiflow\`

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, SyncError};

const APP_DIR: &str = "notiflow";

/// Resolve the default file for a storage key, creating the app directory if needed.
pub fn default_path(key: &str) -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| SyncError::Storage("no config directory on this platform".to_string()))?;
    let app_dir = config_dir.join(APP_DIR);
    std::fs::create_dir_all(&app_dir).map_err(|e| SyncError::Storage(e.to_string()))?;

    // Sanitize key to be a valid filename
    let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
    Ok(app_dir.join(format!("{safe_key}.json")))
}

/// Serialize `value` as JSON and write it to `path`.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| SyncError::Storage(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::Storage(e.to_string()))?;
    }
    std::fs::write(path, json).map_err(|e| SyncError::Storage(e.to_string()))
}

/// Load a value from `path`.
///
/// Returns `None` if the file doesn't exist or deserialization fails.
pub fn load<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let json = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable stored document");
            None
        }
    }
}

/// Remove the document at `path`. Missing files are not an error.
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SyncError::Storage(e.to_string())),
    }
}
