//! MCP service entity, its create request, patches and the versioned update.

pub mod create;
pub mod entity;
pub mod patch;
pub mod update;

use serde::{Deserialize, Serialize};

pub use create::CreateMcpService;
pub use entity::{
    ENTITY_TYPE, McpService, TestConnectionResult, TestConnectionStatus, TestConnectionStep,
};
pub use patch::{FieldPatch, McpServicePatch};
pub use update::{Update, apply_update};

/// Catalog-wide service category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Api,
    Dashboard,
    Database,
    Drive,
    Mcp,
    Messaging,
    Metadata,
    MlModel,
    Pipeline,
    Search,
    Security,
    Storage,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Api => "Api",
            ServiceType::Dashboard => "Dashboard",
            ServiceType::Database => "Database",
            ServiceType::Drive => "Drive",
            ServiceType::Mcp => "Mcp",
            ServiceType::Messaging => "Messaging",
            ServiceType::Metadata => "Metadata",
            ServiceType::MlModel => "MlModel",
            ServiceType::Pipeline => "Pipeline",
            ServiceType::Search => "Search",
            ServiceType::Security => "Security",
            ServiceType::Storage => "Storage",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
