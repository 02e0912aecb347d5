//! Schema for `config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths;
use crate::catalog::{CatalogSettings, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::mcp::DuplicatePolicy;

pub const DEFAULT_USER: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog document; defaults to the user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Name recorded as `updatedBy`; defaults to `$USER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default)]
    pub duplicate_capabilities: DuplicatePolicy,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            user: None,
            duplicate_capabilities: DuplicatePolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            anyhow::bail!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.page_size
            );
        }
        if let Some(user) = &self.user {
            if user.trim().is_empty() {
                anyhow::bail!("user must not be empty");
            }
        }
        Ok(())
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => paths::default_store_path(),
        }
    }

    /// Configured user, then `$USER`, then `admin`.
    pub fn user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_USER.to_string())
    }

    pub fn settings(&self) -> CatalogSettings {
        CatalogSettings {
            duplicate_policy: self.duplicate_capabilities,
            page_size: self.page_size,
        }
    }
}
