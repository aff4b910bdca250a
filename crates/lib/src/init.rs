//! Initialize the configuration directory: create it and seed a default config file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_CFG_CUSTOM_PATH};

/// Ensure the configuration has been initialized (config file exists).
pub fn require_initialized(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `bconsole-bridge init` first (config file not found: {})",
            config_path.display()
        );
    }
    Ok(())
}

/// Config written by `init`: console defaults plus the per-user template, so the keys are discoverable.
pub fn default_config() -> Config {
    let mut config = Config::default();
    config.console.cfg_custom_path = Some(DEFAULT_CFG_CUSTOM_PATH.to_string());
    config
}

/// Create the config directory and the default config file if they do not exist.
/// Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let json = serde_json::to_string_pretty(&default_config())
            .context("serializing default config")?;
        std::fs::write(config_path, json)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}
