//! The MCP service entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceType;
use crate::change::ChangeDescription;
use crate::mcp::{McpConnection, McpPrompt, McpResource, McpTool};
use crate::tags::TagLabel;
use crate::types::{EntityReference, EntityVersion};

/// Entity type name used in references and history envelopes.
pub const ENTITY_TYPE: &str = "mcpService";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestConnectionStatus {
    Failed,
    Running,
    Successful,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionStep {
    pub name: String,
    pub mandatory: bool,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestConnectionStatus>,
    #[serde(default)]
    pub steps: Vec<TestConnectionStep>,
}

impl TestConnectionResult {
    /// Overall status, derived from the steps when not given explicitly.
    pub fn effective_status(&self) -> TestConnectionStatus {
        if let Some(status) = self.status {
            return status;
        }
        if self.steps.iter().any(|s| s.mandatory && !s.passed) {
            TestConnectionStatus::Failed
        } else {
            TestConnectionStatus::Successful
        }
    }
}

/// A registered MCP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpService {
    pub id: Uuid,
    pub name: String,
    pub fully_qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<McpConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<Vec<McpTool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_resources: Option<Vec<McpResource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_prompts: Option<Vec<McpPrompt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_products: Option<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_connection_result: Option<TestConnectionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    pub version: EntityVersion,
    pub updated_at: i64,
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<ChangeDescription>,
    /// Change relative to the previous version only; identical to
    /// `change_description` since versions are never consolidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_change_description: Option<ChangeDescription>,
}

impl McpService {
    pub fn tags(&self) -> &[TagLabel] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn tools(&self) -> &[McpTool] {
        self.available_tools.as_deref().unwrap_or_default()
    }

    pub fn resources(&self) -> &[McpResource] {
        self.available_resources.as_deref().unwrap_or_default()
    }

    pub fn prompts(&self) -> &[McpPrompt] {
        self.available_prompts.as_deref().unwrap_or_default()
    }

    pub fn followers(&self) -> &[EntityReference] {
        self.followers.as_deref().unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    /// Name to show to people: display name when set, else the name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.name)
    }

    /// Copy of the entity without its connection, for callers not allowed
    /// to see launch configuration.
    pub fn redacted(&self) -> Self {
        Self {
            connection: None,
            ..self.clone()
        }
    }
}
