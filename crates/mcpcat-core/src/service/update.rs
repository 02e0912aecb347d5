//! Versioned updates: apply a patch, diff it into a change description and
//! bump the version.

use std::collections::HashSet;

use super::patch::{FieldPatch, McpServicePatch};
use super::McpService;
use crate::change::{ChangeDescription, ChangeSet, MutationContext, UpdateKind};
use crate::error::{CatalogError, CatalogResult};
use crate::fqn;
use crate::mcp::capability::{self, DuplicatePolicy};
use crate::tags;

/// Result of applying a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub entity: McpService,
    /// `None` when the patch changed nothing.
    pub change: Option<ChangeDescription>,
}

impl Update {
    pub fn is_noop(&self) -> bool {
        self.change.is_none()
    }
}

/// Apply `patch` to `current`.
///
/// Returns the next entity state and the change that produced it. A patch
/// that changes nothing returns `current` untouched with no change record.
/// Validation failures leave nothing applied.
pub fn apply_update(
    current: &McpService,
    patch: McpServicePatch,
    ctx: &MutationContext,
    policy: DuplicatePolicy,
) -> CatalogResult<Update> {
    validate_patch(current, &patch, policy)?;

    let mut next = current.clone();
    let mut changes = ChangeSet::new();

    match patch.name {
        FieldPatch::Keep => {}
        FieldPatch::Clear => return Err(CatalogError::validation("name cannot be cleared")),
        FieldPatch::Set(name) => {
            changes.replace("name", &mut next.name, name)?;
            next.fully_qualified_name = fqn::quote_name(&next.name);
        }
    }

    changes.apply("displayName", &mut next.display_name, patch.display_name)?;
    changes.apply("description", &mut next.description, patch.description)?;
    changes.apply(
        "serverInstructions",
        &mut next.server_instructions,
        patch.server_instructions,
    )?;
    changes.apply("connection", &mut next.connection, patch.connection)?;
    changes.apply("availableTools", &mut next.available_tools, patch.available_tools)?;
    changes.apply(
        "availableResources",
        &mut next.available_resources,
        patch.available_resources,
    )?;
    changes.apply(
        "availablePrompts",
        &mut next.available_prompts,
        patch.available_prompts,
    )?;
    changes.apply("tags", &mut next.tags, patch.tags)?;
    changes.apply("owners", &mut next.owners, patch.owners)?;
    changes.apply("domains", &mut next.domains, patch.domains)?;
    changes.apply("dataProducts", &mut next.data_products, patch.data_products)?;
    changes.apply("pipelines", &mut next.pipelines, patch.pipelines)?;

    if removes_capabilities(current, &next) {
        changes.escalate(UpdateKind::Major);
    }

    commit(current, next, changes, ctx)
}

/// Finalize a mutation: bump the version and attach the change record, or
/// hand back `current` untouched when `changes` is empty.
///
/// Fails with `Validation` when the version counter has no room left.
pub fn commit(
    current: &McpService,
    mut next: McpService,
    changes: ChangeSet,
    ctx: &MutationContext,
) -> CatalogResult<Update> {
    if changes.is_empty() {
        tracing::debug!(service = %current.fully_qualified_name, "No changes; version kept");
        return Ok(Update {
            entity: current.clone(),
            change: None,
        });
    }

    let kind = changes.kind();
    let version = kind.next_version(current.version).ok_or_else(|| {
        CatalogError::validation(format!(
            "version {} of '{}' cannot be incremented",
            current.version, current.fully_qualified_name
        ))
    })?;
    let description = changes.into_description(current.version, ctx);

    next.version = version;
    next.updated_at = ctx.at;
    next.updated_by = ctx.user.clone();
    next.change_description = Some(description.clone());
    next.incremental_change_description = Some(description.clone());

    Ok(Update {
        entity: next,
        change: Some(description),
    })
}

fn validate_patch(
    current: &McpService,
    patch: &McpServicePatch,
    policy: DuplicatePolicy,
) -> CatalogResult<()> {
    if let Some(id) = patch.id {
        if id != current.id {
            return Err(CatalogError::validation("id is immutable"));
        }
    }
    if let Some(service_type) = patch.service_type {
        if service_type != current.service_type {
            return Err(CatalogError::validation(format!(
                "serviceType is immutable: cannot change '{}' to '{}'",
                current.service_type, service_type
            )));
        }
    }
    if let Some(name) = patch.name.as_set() {
        fqn::validate_name(name)?;
    }
    if let Some(connection) = patch.connection.as_set() {
        connection.validate(current.service_type)?;
    }

    let tools = patch.available_tools.as_set().map(Vec::as_slice);
    let resources = patch.available_resources.as_set().map(Vec::as_slice);
    let prompts = patch.available_prompts.as_set().map(Vec::as_slice);
    capability::validate_required(tools, resources, prompts)?;
    capability::enforce(
        &capability::check_capabilities(tools, resources, prompts),
        policy,
    )?;

    if let Some(tags) = patch.tags.as_set() {
        tags::validate_unique(tags)?;
    }
    Ok(())
}

/// True when a tool, resource or prompt available before is gone after.
fn removes_capabilities(before: &McpService, after: &McpService) -> bool {
    fn lost<'a>(
        old: impl Iterator<Item = &'a str>,
        new: impl Iterator<Item = &'a str>,
    ) -> bool {
        let new: HashSet<&str> = new.collect();
        old.into_iter().any(|id| !new.contains(id))
    }

    lost(
        before.tools().iter().map(|t| t.name.as_str()),
        after.tools().iter().map(|t| t.name.as_str()),
    ) || lost(
        before.resources().iter().map(|r| r.uri.as_str()),
        after.resources().iter().map(|r| r.uri.as_str()),
    ) || lost(
        before.prompts().iter().map(|p| p.name.as_str()),
        after.prompts().iter().map(|p| p.name.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{McpConnection, McpServerConfig, McpTool};
    use crate::service::{CreateMcpService, ServiceType};
    use crate::types::EntityVersion;
    use serde_json::Value;
    use uuid::Uuid;

    fn ctx() -> MutationContext {
        MutationContext::manual("alice").at(2_000)
    }

    fn service() -> McpService {
        CreateMcpService::new(
            "filesystem",
            McpConnection::new(McpServerConfig::new("node").with_args(["mcp-server.js"])),
        )
        .with_tools(vec![McpTool::new("read_file"), McpTool::new("write_file")])
        .into_entity(Uuid::new_v4(), &MutationContext::manual("admin").at(1_000))
    }

    fn apply(current: &McpService, patch: McpServicePatch) -> CatalogResult<Update> {
        apply_update(current, patch, &ctx(), DuplicatePolicy::Warn)
    }

    #[test]
    fn empty_patch_is_noop() {
        let current = service();
        let update = apply(&current, McpServicePatch::new()).unwrap();
        assert!(update.is_noop());
        assert_eq!(update.entity, current);
    }

    #[test]
    fn identical_values_are_noop() {
        let current = service();
        let patch = McpServicePatch {
            connection: FieldPatch::Set(current.connection.clone().unwrap()),
            service_type: Some(ServiceType::Mcp),
            id: Some(current.id),
            ..McpServicePatch::default()
        };
        let update = apply(&current, patch).unwrap();
        assert!(update.is_noop());
        assert_eq!(update.entity.version, EntityVersion::INITIAL);
    }

    #[test]
    fn adding_description_is_one_added_change() {
        let current = service();
        let patch = McpServicePatch {
            description: FieldPatch::Set("description1".into()),
            ..McpServicePatch::default()
        };
        let update = apply(&current, patch).unwrap();
        let change = update.change.unwrap();
        assert_eq!(change.added().len(), 1);
        assert_eq!(change.added()[0].name, "description");
        assert_eq!(change.added()[0].new_value, Some(Value::from("description1")));
        assert!(change.updated().is_empty());
        assert!(change.deleted().is_empty());
        assert_eq!(change.previous_version, Some(EntityVersion::INITIAL));
        assert_eq!(update.entity.version, EntityVersion::from_tenths(2));
        assert_eq!(update.entity.updated_by, "alice");
        assert_eq!(update.entity.updated_at, 2_000);
    }

    #[test]
    fn updating_and_deleting_land_in_their_buckets() {
        let mut current = service();
        current.description = Some("old".into());
        current.display_name = Some("Files".into());

        let update = apply(
            &current,
            McpServicePatch {
                description: FieldPatch::Set("new".into()),
                ..McpServicePatch::default()
            },
        )
        .unwrap();
        let change = update.change.unwrap();
        assert_eq!(change.updated().len(), 1);
        assert_eq!(change.updated()[0].old_value, Some(Value::from("old")));
        assert_eq!(change.updated()[0].new_value, Some(Value::from("new")));

        let update = apply(
            &current,
            McpServicePatch {
                display_name: FieldPatch::Clear,
                ..McpServicePatch::default()
            },
        )
        .unwrap();
        let change = update.change.unwrap();
        assert_eq!(change.deleted().len(), 1);
        assert_eq!(change.deleted()[0].old_value, Some(Value::from("Files")));
        assert!(update.entity.display_name.is_none());
    }

    #[test]
    fn service_type_change_is_rejected() {
        let current = service();
        let patch = McpServicePatch {
            service_type: Some(ServiceType::Database),
            description: FieldPatch::Set("x".into()),
            ..McpServicePatch::default()
        };
        let err = apply(&current, patch).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn id_change_is_rejected() {
        let current = service();
        let patch = McpServicePatch {
            id: Some(Uuid::new_v4()),
            ..McpServicePatch::default()
        };
        assert!(apply(&current, patch).unwrap_err().is_validation());
    }

    #[test]
    fn connection_without_command_is_rejected() {
        let current = service();
        let patch = McpServicePatch {
            connection: FieldPatch::Set(McpConnection::new(McpServerConfig::default())),
            ..McpServicePatch::default()
        };
        assert!(apply(&current, patch).unwrap_err().is_validation());
    }

    #[test]
    fn clearing_name_is_rejected() {
        let current = service();
        let patch = McpServicePatch {
            name: FieldPatch::Clear,
            ..McpServicePatch::default()
        };
        assert!(apply(&current, patch).is_err());
    }

    #[test]
    fn rename_recomputes_fqn() {
        let current = service();
        let patch = McpServicePatch {
            name: FieldPatch::Set("files.v2".into()),
            ..McpServicePatch::default()
        };
        let update = apply(&current, patch).unwrap();
        assert_eq!(update.entity.fully_qualified_name, "\"files.v2\"");
        assert_eq!(update.change.unwrap().updated()[0].name, "name");
    }

    #[test]
    fn removing_a_tool_is_major() {
        let current = service();
        let patch = McpServicePatch {
            available_tools: FieldPatch::Set(vec![McpTool::new("read_file")]),
            ..McpServicePatch::default()
        };
        let update = apply(&current, patch).unwrap();
        assert_eq!(update.entity.version, EntityVersion::from_tenths(11));
    }

    #[test]
    fn adding_a_tool_is_minor() {
        let current = service();
        let mut tools = current.tools().to_vec();
        tools.push(McpTool::new("list_dir"));
        let patch = McpServicePatch {
            available_tools: FieldPatch::Set(tools),
            ..McpServicePatch::default()
        };
        let update = apply(&current, patch).unwrap();
        assert_eq!(update.entity.version, EntityVersion::from_tenths(2));
        assert_eq!(update.change.unwrap().updated()[0].name, "availableTools");
    }

    #[test]
    fn duplicate_tools_rejected_under_reject_policy() {
        let current = service();
        let patch = McpServicePatch {
            available_tools: FieldPatch::Set(vec![McpTool::new("search"), McpTool::new("search")]),
            ..McpServicePatch::default()
        };
        assert!(apply_update(&current, patch.clone(), &ctx(), DuplicatePolicy::Reject).is_err());
        assert!(apply_update(&current, patch, &ctx(), DuplicatePolicy::Warn).is_ok());
    }

    #[test]
    fn exhausted_version_is_rejected() {
        let mut current = service();
        current.version = EntityVersion::from_tenths(u32::MAX);
        let patch = McpServicePatch {
            description: FieldPatch::Set("d".into()),
            ..McpServicePatch::default()
        };
        assert!(apply(&current, patch).unwrap_err().is_validation());

        current.version = EntityVersion::from_tenths(u32::MAX - 1);
        let patch = McpServicePatch {
            available_tools: FieldPatch::Set(vec![McpTool::new("read_file")]),
            ..McpServicePatch::default()
        };
        assert!(apply(&current, patch).unwrap_err().is_validation());
    }

    #[test]
    fn multiple_fields_one_entry_each() {
        let current = service();
        let patch = McpServicePatch {
            description: FieldPatch::Set("d".into()),
            server_instructions: FieldPatch::Set("use for files".into()),
            ..McpServicePatch::default()
        };
        let change = apply(&current, patch).unwrap().change.unwrap();
        assert_eq!(change.changed_fields(), vec!["description", "serverInstructions"]);
        assert_eq!(change.change_summary.unwrap().len(), 2);
    }
}
