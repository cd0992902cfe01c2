//! Configuration loading from file system

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use super::types::Settings;
use crate::error::HubError;

/// Resolve which config file to read: explicit path, then `AI_HUB_CONFIG`,
/// then `~/.ai-hub/config.json`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let raw = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Load settings from `path`. A missing file yields defaults; a malformed
/// file is an error.
pub fn load_config_from(path: &Path) -> Result<Settings, HubError> {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| HubError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let settings: Settings = serde_json::from_str(&raw)
        .map_err(|e| HubError::Config(format!("{}: {}", path.display(), e)))?;

    if settings.hotstrings.buffer_size == 0 {
        return Err(HubError::Config(format!(
            "{}: hotstrings.bufferSize must be at least 1",
            path.display()
        )));
    }

    info!(path = %path.display(), "Successfully loaded config");
    Ok(settings)
}

/// Load settings, falling back to defaults on any failure.
#[instrument(name = "load_config")]
pub fn load_config(explicit: Option<&Path>) -> Settings {
    let path = config_path(explicit);
    match load_config_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Settings::default()
        }
    }
}
