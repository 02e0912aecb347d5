//! In-memory entity store.

use std::collections::HashMap;

use uuid::Uuid;

use super::{EntityStore, ServiceRecord};
use crate::error::{CatalogError, CatalogResult};
use crate::service::McpService;
use crate::types::EntityVersion;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<Uuid, ServiceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.current.id, r))
                .collect(),
        }
    }

    /// Records sorted by FQN.
    pub fn records(&self) -> Vec<ServiceRecord> {
        let mut records: Vec<ServiceRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.current
                .fully_qualified_name
                .cmp(&b.current.fully_qualified_name)
        });
        records
    }

    fn name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.records
            .values()
            .any(|r| r.current.name == name && Some(r.current.id) != except)
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: Uuid) -> CatalogResult<Option<McpService>> {
        Ok(self.records.get(&id).map(|r| r.current.clone()))
    }

    fn get_by_fqn(&self, fqn: &str) -> CatalogResult<Option<McpService>> {
        Ok(self
            .records
            .values()
            .find(|r| r.current.fully_qualified_name == fqn)
            .map(|r| r.current.clone()))
    }

    fn list(&self) -> CatalogResult<Vec<McpService>> {
        Ok(self.records().into_iter().map(|r| r.current).collect())
    }

    fn insert(&mut self, entity: McpService) -> CatalogResult<()> {
        if self.records.contains_key(&entity.id) {
            return Err(CatalogError::Conflict(format!(
                "entity {} already exists",
                entity.id
            )));
        }
        if self.name_taken(&entity.name, None) {
            return Err(CatalogError::Conflict(format!(
                "service '{}' already exists",
                entity.name
            )));
        }
        self.records.insert(
            entity.id,
            ServiceRecord {
                current: entity,
                history: Vec::new(),
            },
        );
        Ok(())
    }

    fn replace(&mut self, entity: McpService, expected: EntityVersion) -> CatalogResult<()> {
        if self.name_taken(&entity.name, Some(entity.id)) {
            return Err(CatalogError::Conflict(format!(
                "service '{}' already exists",
                entity.name
            )));
        }
        let record = self
            .records
            .get_mut(&entity.id)
            .ok_or_else(|| CatalogError::NotFound(format!("mcpService {}", entity.id)))?;
        if record.current.version != expected {
            return Err(CatalogError::Conflict(format!(
                "mcpService {} is at version {}, update was based on {}",
                entity.id, record.current.version, expected
            )));
        }
        let previous = std::mem::replace(&mut record.current, entity);
        record.history.push(previous);
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> CatalogResult<McpService> {
        self.records
            .remove(&id)
            .map(|r| r.current)
            .ok_or_else(|| CatalogError::NotFound(format!("mcpService {id}")))
    }

    fn history(&self, id: Uuid) -> CatalogResult<Vec<McpService>> {
        self.records
            .get(&id)
            .map(|r| r.history.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("mcpService {id}")))
    }
}
