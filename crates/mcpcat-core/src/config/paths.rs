//! Default locations for the config file and the catalog store.

use std::path::PathBuf;

use anyhow::Context;

pub const APP_DIR: &str = "mcpcat";
pub const CONFIG_FILE: &str = "config.toml";
pub const STORE_FILE: &str = "catalog.json";

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_local_dir().context("Could not determine data directory")?;
    Ok(dir.join(APP_DIR).join(STORE_FILE))
}
