//! Create requests for MCP services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::{FieldPatch, McpServicePatch};
use super::{McpService, ServiceType};
use crate::change::MutationContext;
use crate::error::{CatalogError, CatalogResult};
use crate::fqn;
use crate::mcp::capability::{self, DuplicatePolicy};
use crate::mcp::{McpConnection, McpPrompt, McpResource, McpTool};
use crate::tags::{self, TagLabel};
use crate::types::{EntityReference, EntityVersion};

/// Fields a client may supply when registering a service. Identity, version
/// and audit fields are assigned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMcpService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub service_type: ServiceType,
    /// Required; kept optional so a missing connection is a validation error.
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
}

impl CreateMcpService {
    pub fn new(name: impl Into<String>, connection: McpConnection) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            service_type: ServiceType::Mcp,
            connection: Some(connection),
            available_tools: None,
            available_resources: None,
            available_prompts: None,
            server_instructions: None,
            tags: None,
            owners: None,
            domains: None,
            data_products: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<McpTool>) -> Self {
        self.available_tools = Some(tools);
        self
    }

    pub fn with_tags(mut self, tags: Vec<TagLabel>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Check the request before anything is assigned.
    pub fn validate(&self, policy: DuplicatePolicy) -> CatalogResult<()> {
        fqn::validate_name(&self.name)?;

        if self.service_type != ServiceType::Mcp {
            return Err(CatalogError::validation(format!(
                "MCP services require serviceType '{}', got '{}'",
                ServiceType::Mcp,
                self.service_type
            )));
        }

        self.connection
            .as_ref()
            .ok_or_else(|| CatalogError::validation("connection must not be null"))?
            .validate(self.service_type)?;

        let tools = self.available_tools.as_deref();
        let resources = self.available_resources.as_deref();
        let prompts = self.available_prompts.as_deref();
        capability::validate_required(tools, resources, prompts)?;
        capability::enforce(
            &capability::check_capabilities(tools, resources, prompts),
            policy,
        )?;

        if let Some(tags) = &self.tags {
            tags::validate_unique(tags)?;
        }

        Ok(())
    }

    /// Build the initial entity. Call [`CreateMcpService::validate`] first.
    pub fn into_entity(self, id: Uuid, ctx: &MutationContext) -> McpService {
        McpService {
            id,
            fully_qualified_name: fqn::quote_name(&self.name),
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            service_type: self.service_type,
            connection: self.connection,
            available_tools: self.available_tools,
            available_resources: self.available_resources,
            available_prompts: self.available_prompts,
            server_instructions: self.server_instructions,
            tags: self.tags,
            owners: self.owners,
            domains: self.domains,
            data_products: self.data_products,
            followers: None,
            pipelines: None,
            test_connection_result: None,
            deleted: None,
            version: EntityVersion::INITIAL,
            updated_at: ctx.at,
            updated_by: ctx.user.clone(),
            change_description: None,
            incremental_change_description: None,
        }
    }

    /// Patch that brings an existing entity in line with this request.
    ///
    /// Supplied fields are set; omitted optional fields are kept.
    pub fn into_patch(self) -> McpServicePatch {
        McpServicePatch {
            id: None,
            service_type: Some(self.service_type),
            name: FieldPatch::Keep,
            display_name: FieldPatch::from_option(self.display_name),
            description: FieldPatch::from_option(self.description),
            server_instructions: FieldPatch::from_option(self.server_instructions),
            connection: FieldPatch::from_option(self.connection),
            available_tools: FieldPatch::from_option(self.available_tools),
            available_resources: FieldPatch::from_option(self.available_resources),
            available_prompts: FieldPatch::from_option(self.available_prompts),
            tags: FieldPatch::from_option(self.tags),
            owners: FieldPatch::from_option(self.owners),
            domains: FieldPatch::from_option(self.domains),
            data_products: FieldPatch::from_option(self.data_products),
            pipelines: FieldPatch::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::McpServerConfig;

    fn request() -> CreateMcpService {
        CreateMcpService::new(
            "filesystem",
            McpConnection::new(
                McpServerConfig::new("node")
                    .with_args(["mcp-server.js"])
                    .with_env("NODE_ENV", "development"),
            ),
        )
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate(DuplicatePolicy::Warn).is_ok());
    }

    #[test]
    fn missing_connection_is_rejected() {
        let mut req = request();
        req.connection = None;
        let err = req.validate(DuplicatePolicy::Warn).unwrap_err();
        assert!(err.to_string().contains("connection must not be null"));
    }

    #[test]
    fn non_mcp_service_type_is_rejected() {
        let mut req = request();
        req.service_type = ServiceType::Database;
        assert!(req.validate(DuplicatePolicy::Warn).unwrap_err().is_validation());
    }

    #[test]
    fn entity_gets_initial_version_and_fqn() {
        let ctx = MutationContext::manual("admin").at(42);
        let id = Uuid::new_v4();
        let entity = CreateMcpService::new(
            "acme.files",
            McpConnection::new(McpServerConfig::new("node")),
        )
        .with_display_name("Acme Files")
        .into_entity(id, &ctx);
        assert_eq!(entity.id, id);
        assert_eq!(entity.label(), "Acme Files");
        assert_eq!(entity.fully_qualified_name, "\"acme.files\"");
        assert_eq!(entity.version, EntityVersion::INITIAL);
        assert_eq!(entity.updated_at, 42);
        assert_eq!(entity.updated_by, "admin");
        assert!(entity.change_description.is_none());
        assert!(!entity.is_deleted());
        assert!(entity.deleted.is_none());
    }

    #[test]
    fn into_patch_keeps_omitted_fields() {
        let patch = request().with_description("d").into_patch();
        assert_eq!(patch.description, FieldPatch::Set("d".to_string()));
        assert_eq!(patch.display_name, FieldPatch::Keep);
        assert_eq!(patch.owners, FieldPatch::Keep);
        assert!(patch.connection.as_set().is_some());
    }

    #[test]
    fn missing_name_field_fails_to_parse() {
        let json = r#"{"serviceType":"Mcp","connection":{"config":{"config":{"command":"node"}}}}"#;
        assert!(serde_json::from_str::<CreateMcpService>(json).is_err());
    }
}
