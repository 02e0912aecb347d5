//! JSON file persistence for the catalog.
//!
//! The whole catalog lives in one JSON document; the persisted form of each
//! entity is its wire form. Every mutation rewrites the document atomically
//! (tmp + rename), and the in-memory state only advances once the write
//! succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityStore, MemoryStore, ServiceRecord};
use crate::error::{CatalogError, CatalogResult};
use crate::service::McpService;
use crate::types::EntityVersion;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    format_version: u32,
    #[serde(default)]
    services: Vec<ServiceRecord>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| {
                CatalogError::Storage(format!("Failed to read store {}: {e}", path.display()))
            })?;
            let document: StoreDocument = serde_json::from_slice(&bytes)?;
            if document.format_version != FORMAT_VERSION {
                return Err(CatalogError::Storage(format!(
                    "Unsupported store format version: {}",
                    document.format_version
                )));
            }
            tracing::debug!(
                path = %path.display(),
                services = document.services.len(),
                "Loaded catalog store"
            );
            MemoryStore::from_records(document.services)
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against a staged copy and persist it before committing.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut MemoryStore) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut staged = self.inner.clone();
        let out = op(&mut staged)?;
        self.save(&staged)?;
        self.inner = staged;
        Ok(out)
    }

    fn save(&self, store: &MemoryStore) -> CatalogResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).map_err(|e| {
            CatalogError::Storage(format!(
                "Failed to create store directory {}: {e}",
                dir.display()
            ))
        })?;

        let document = StoreDocument {
            format_version: FORMAT_VERSION,
            services: store.records(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "catalog.json".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        fs::write(&tmp_path, bytes).map_err(|e| {
            CatalogError::Storage(format!("Failed to write {}: {e}", tmp_path.display()))
        })?;
        // Windows rename does not replace
        if cfg!(windows) && self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            CatalogError::Storage(format!(
                "Failed to replace store {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Saved catalog store");
        Ok(())
    }
}

impl EntityStore for JsonFileStore {
    fn get(&self, id: Uuid) -> CatalogResult<Option<McpService>> {
        self.inner.get(id)
    }

    fn get_by_fqn(&self, fqn: &str) -> CatalogResult<Option<McpService>> {
        self.inner.get_by_fqn(fqn)
    }

    fn list(&self) -> CatalogResult<Vec<McpService>> {
        self.inner.list()
    }

    fn insert(&mut self, entity: McpService) -> CatalogResult<()> {
        self.mutate(|store| store.insert(entity))
    }

    fn replace(&mut self, entity: McpService, expected: EntityVersion) -> CatalogResult<()> {
        self.mutate(|store| store.replace(entity, expected))
    }

    fn remove(&mut self, id: Uuid) -> CatalogResult<McpService> {
        self.mutate(|store| store.remove(id))
    }

    fn history(&self, id: Uuid) -> CatalogResult<Vec<McpService>> {
        self.inner.history(id)
    }
}
