use crate::error::{AppError, Result};
use crate::models::config_types::{RawConfig, SorterConfig};
use std::path::Path;
use tracing::debug;

/// Check for and load the JSON configuration file.
pub fn load_config(path: &Path) -> Result<SorterConfig> {
    if !path.exists() {
        return Err(AppError::ConfigNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    let config = parse_config(&content, path)?;

    debug!(path = %path.display(), ?config, "Loaded configuration");
    Ok(config)
}

/// Validate config content that is already in memory. `origin` is only used in errors.
pub fn parse_config(content: &str, origin: &Path) -> Result<SorterConfig> {
    let raw: RawConfig = serde_json::from_str(content).map_err(|e| AppError::ConfigParse {
        path: origin.to_path_buf(),
        source: e,
    })?;
    raw.validate()
}
