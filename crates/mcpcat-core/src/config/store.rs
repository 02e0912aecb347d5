//! Config store for loading and saving `config.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{CatalogConfig, parser, paths};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_default() -> anyhow::Result<Self> {
        Ok(Self::from_path(paths::default_config_path()?))
    }

    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config; a missing file means defaults.
    pub fn load(&self) -> anyhow::Result<CatalogConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file; using defaults");
            return Ok(CatalogConfig::new());
        }
        parser::parse_config(&self.config_path)
    }

    pub fn save(&self, config: &CatalogConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::from_path(temp.path().join("config.toml"));
        assert_eq!(store.load().unwrap(), CatalogConfig::default());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::from_path(temp.path().join("nested").join("config.toml"));
        let config = CatalogConfig {
            user: Some("ops".into()),
            ..CatalogConfig::default()
        };
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }
}
