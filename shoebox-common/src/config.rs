//! Configuration file loading
//!
//! Shoebox reads an optional TOML file for defaults the CLI does not
//! supply. Resolution priority for every setting is: command-line flag,
//! then environment variable, then this file, then the compiled default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents
///
/// Every field is optional; absent fields fall through to the compiled
/// defaults of whichever pipeline is running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Inference service API key
    pub api_key: Option<String>,
    /// Default image folder to scan
    pub root_folder: Option<String>,
    /// Default ledger file path
    pub ledger: Option<String>,
    /// Daily classification call cap
    pub daily_limit: Option<u32>,
}

/// Platform configuration file path: `<config dir>/shoebox/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shoebox").join("config.toml"))
}

/// Load a TOML config file, returning defaults when the file is absent
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load from the default location
///
/// A missing file or undeterminable config directory yields defaults; a
/// present-but-malformed file is logged and also yields defaults so a bad
/// config file never blocks a run that supplies everything on the CLI.
pub fn load_default_config() -> TomlConfig {
    let Some(path) = default_config_path() else {
        return TomlConfig::default();
    };

    match load_toml_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}
