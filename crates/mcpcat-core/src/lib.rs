//! mcpcat Core Library
//!
//! Catalog entity for MCP services: the data model, versioned updates with
//! field-level change descriptions, capability and tag reconciliation, form
//! schemas for connection editors, live capability discovery over stdio, and
//! pluggable persistence.

pub mod catalog;
pub mod change;
pub mod config;
pub mod error;
pub mod fqn;
pub mod import;
pub mod mcp;
pub mod permissions;
pub mod service;
pub mod store;
pub mod tags;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Catalog
    pub use crate::catalog::{
        CatalogService, CatalogSettings, EntityHistory, ListParams, PutOutcome, ResultList,
    };

    // Configuration
    pub use crate::config::{CatalogConfig, ConfigStore};

    // Entity
    pub use crate::service::{
        CreateMcpService, FieldPatch, McpService, McpServicePatch, ServiceType,
        TestConnectionResult, Update,
    };

    // MCP
    pub use crate::mcp::{
        DiscoveryReport, DuplicatePolicy, McpConnection, McpConnector, McpPrompt, McpResource,
        McpServerConfig, McpTool, McpType, StdioConnector,
    };

    // Changes
    pub use crate::change::{ChangeDescription, ChangeSource, FieldChange, MutationContext};

    // Tags
    pub use crate::tags::{TagLabel, TagSelection, TagSource};

    // Store
    pub use crate::store::{EntityStore, JsonFileStore, MemoryStore};

    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::types::{EntityReference, EntityVersion, Include};
}
