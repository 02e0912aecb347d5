//! Entity persistence.
//!
//! The catalog talks to storage through [`EntityStore`]. Stores enforce
//! optimistic concurrency: a replacement names the version it was based on
//! and is refused when the stored version has moved on.

pub mod file;
pub mod memory;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::service::McpService;
use crate::types::EntityVersion;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Current state of one entity plus every state it replaced, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub current: McpService,
    #[serde(default)]
    pub history: Vec<McpService>,
}

pub trait EntityStore {
    fn get(&self, id: Uuid) -> CatalogResult<Option<McpService>>;

    fn get_by_fqn(&self, fqn: &str) -> CatalogResult<Option<McpService>>;

    /// Every stored entity, deleted ones included.
    fn list(&self) -> CatalogResult<Vec<McpService>>;

    /// Store a new entity. Fails with `Conflict` when the name is taken.
    fn insert(&mut self, entity: McpService) -> CatalogResult<()>;

    /// Replace the entity with the same id, moving the old state to history.
    ///
    /// Fails with `NotFound` when absent and `Conflict` when the stored
    /// version differs from `expected`.
    fn replace(&mut self, entity: McpService, expected: EntityVersion) -> CatalogResult<()>;

    /// Remove the entity and its history for good.
    fn remove(&mut self, id: Uuid) -> CatalogResult<McpService>;

    /// Prior states of the entity, oldest first.
    fn history(&self, id: Uuid) -> CatalogResult<Vec<McpService>>;
}
