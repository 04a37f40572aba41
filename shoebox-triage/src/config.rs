//! API key resolution
//!
//! Two-tier resolution with ENV → TOML priority. The key never comes from
//! a CLI flag to keep it out of shell history. A missing key is the one
//! fatal setup error: it aborts before any file is touched.

use shoebox_common::config::TomlConfig;
use shoebox_common::{Error, Result};
use tracing::{info, warn};

/// Environment variable holding the inference service API key
pub const API_KEY_ENV: &str = "SHOEBOX_API_KEY";

/// Resolve the API key from ENV then TOML
///
/// Warns when both sources hold a valid key, since a stale TOML entry
/// silently shadowed by the environment is a common misconfiguration.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found in both environment and TOML config. \
             Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "API key not configured. Provide it using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: ~/.config/shoebox/config.toml (api_key = \"your-key\")",
        API_KEY_ENV
    )))
}

/// Validate an API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
