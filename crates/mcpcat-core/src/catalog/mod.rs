//! The MCP service catalog: every read and versioned mutation, on top of an
//! [`EntityStore`].
//!
//! Mutations follow one shape: load the current state, compute the next one
//! through a [`ChangeSet`], then hand it to the store together with the
//! version it was based on. No-op mutations never reach the store.

pub mod list;

use uuid::Uuid;

use crate::change::{ChangeSet, MutationContext};
use crate::error::{CatalogError, CatalogResult};
use crate::fqn;
use crate::mcp::{DuplicatePolicy, McpConnector, McpServerConfig, discovery};
use crate::service::update::commit;
use crate::service::{
    CreateMcpService, ENTITY_TYPE, FieldPatch, McpService, McpServicePatch, TestConnectionResult,
    Update, apply_update,
};
use crate::store::EntityStore;
use crate::tags::{TagSelection, merge_tier, reconcile_tags, split_tier};
use crate::types::{EntityReference, EntityVersion, Include, now_millis};

pub use list::{EntityHistory, ListParams, Paging, ResultList};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Knobs the catalog applies to every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSettings {
    pub duplicate_policy: DuplicatePolicy,
    pub page_size: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Warn,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// What a create-or-update call did.
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    Created(McpService),
    Updated(Update),
    Unchanged(McpService),
}

impl PutOutcome {
    pub fn entity(&self) -> &McpService {
        match self {
            PutOutcome::Created(entity) | PutOutcome::Unchanged(entity) => entity,
            PutOutcome::Updated(update) => &update.entity,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            PutOutcome::Created(_) => "created",
            PutOutcome::Updated(_) => "updated",
            PutOutcome::Unchanged(_) => "unchanged",
        }
    }
}

pub struct CatalogService<S: EntityStore> {
    store: S,
    settings: CatalogSettings,
    clock: fn() -> i64,
}

impl<S: EntityStore> CatalogService<S> {
    pub fn new(store: S, settings: CatalogSettings) -> Self {
        Self {
            store,
            settings,
            clock: now_millis,
        }
    }

    /// Replace the clock used to stamp catalog-assigned timestamps.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a new service at version 0.1.
    pub fn create(
        &mut self,
        request: CreateMcpService,
        ctx: &MutationContext,
    ) -> CatalogResult<McpService> {
        request.validate(self.settings.duplicate_policy)?;

        let fqn = fqn::quote_name(&request.name);
        if self.store.get_by_fqn(&fqn)?.is_some() {
            return Err(CatalogError::Conflict(format!(
                "{ENTITY_TYPE} '{fqn}' already exists"
            )));
        }

        let entity = request.into_entity(Uuid::new_v4(), ctx);
        self.store.insert(entity.clone())?;
        tracing::info!(
            service = %entity.fully_qualified_name,
            id = %entity.id,
            user = %ctx.user,
            "Created service"
        );
        Ok(entity)
    }

    /// Create the service, or bring the existing one with the same name in
    /// line with `request`.
    pub fn create_or_update(
        &mut self,
        request: CreateMcpService,
        ctx: &MutationContext,
    ) -> CatalogResult<PutOutcome> {
        let fqn = fqn::quote_name(&request.name);
        let Some(current) = self.store.get_by_fqn(&fqn)? else {
            return self.create(request, ctx).map(PutOutcome::Created);
        };
        if current.is_deleted() {
            return Err(CatalogError::validation(format!(
                "{ENTITY_TYPE} '{fqn}' is deleted; restore it before updating"
            )));
        }

        request.validate(self.settings.duplicate_policy)?;
        let update = self.apply_patch(&current, request.into_patch(), ctx)?;
        Ok(if update.is_noop() {
            PutOutcome::Unchanged(update.entity)
        } else {
            PutOutcome::Updated(update)
        })
    }

    /// Apply `patch` to the service `id`.
    ///
    /// With `base_version` set, the patch is refused with `Conflict` unless
    /// the service is still at that version.
    pub fn update(
        &mut self,
        id: Uuid,
        patch: McpServicePatch,
        base_version: Option<EntityVersion>,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        if let Some(base) = base_version {
            if base != current.version {
                return Err(CatalogError::Conflict(format!(
                    "{ENTITY_TYPE} {id} is at version {}, patch was based on {base}",
                    current.version
                )));
            }
        }
        ensure_live(&current)?;
        self.apply_patch(&current, patch, ctx)
    }

    pub fn get(&self, id: Uuid, include: Include) -> CatalogResult<McpService> {
        let entity = self.load(id)?;
        if include.admits(entity.is_deleted()) {
            Ok(entity)
        } else {
            Err(CatalogError::NotFound(format!("{ENTITY_TYPE} {id}")))
        }
    }

    pub fn get_by_name(&self, fqn: &str, include: Include) -> CatalogResult<McpService> {
        self.store
            .get_by_fqn(fqn)?
            .filter(|e| include.admits(e.is_deleted()))
            .ok_or_else(|| CatalogError::NotFound(format!("{ENTITY_TYPE} '{fqn}'")))
    }

    pub fn list(&self, params: &ListParams) -> CatalogResult<ResultList<McpService>> {
        let limit = params.limit.unwrap_or(self.settings.page_size);
        if limit > MAX_PAGE_SIZE {
            return Err(CatalogError::validation(format!(
                "limit must be at most {MAX_PAGE_SIZE}, got {limit}"
            )));
        }
        Ok(list::paginate(self.store.list()?, params, limit))
    }

    /// Mark the service deleted. Repeating the call changes nothing.
    pub fn soft_delete(&mut self, id: Uuid, ctx: &MutationContext) -> CatalogResult<Update> {
        self.set_deleted(id, true, ctx)
    }

    /// Undo a soft delete. Restoring a live service changes nothing.
    pub fn restore(&mut self, id: Uuid, ctx: &MutationContext) -> CatalogResult<Update> {
        self.set_deleted(id, false, ctx)
    }

    /// Remove the service and its whole history.
    pub fn hard_delete(&mut self, id: Uuid) -> CatalogResult<McpService> {
        let removed = self.store.remove(id)?;
        tracing::info!(
            service = %removed.fully_qualified_name,
            id = %removed.id,
            "Hard deleted service"
        );
        Ok(removed)
    }

    pub fn list_versions(&self, id: Uuid) -> CatalogResult<EntityHistory> {
        let current = self.load(id)?;
        let mut versions = self.store.history(id)?;
        versions.push(current);
        versions.reverse();
        Ok(EntityHistory {
            entity_type: ENTITY_TYPE.to_string(),
            versions,
        })
    }

    pub fn get_version(&self, id: Uuid, version: EntityVersion) -> CatalogResult<McpService> {
        self.list_versions(id)?
            .versions
            .into_iter()
            .find(|v| v.version == version)
            .ok_or_else(|| {
                CatalogError::NotFound(format!("{ENTITY_TYPE} {id} version {version}"))
            })
    }

    /// Add `user` to the followers. Following twice changes nothing.
    pub fn add_follower(
        &mut self,
        id: Uuid,
        user: EntityReference,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        ensure_live(&current)?;
        if current.followers().iter().any(|f| f.id == user.id) {
            return Ok(unchanged(current));
        }

        let mut next = current.clone();
        let mut changes = ChangeSet::new();
        changes.element_added("followers", serde_json::to_value(&user)?);
        next.followers.get_or_insert_with(Vec::new).push(user);
        self.persist(&current, commit(&current, next, changes, ctx)?, ctx)
    }

    /// Drop `user_id` from the followers. Not following changes nothing.
    pub fn remove_follower(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        ensure_live(&current)?;
        let Some(position) = current.followers().iter().position(|f| f.id == user_id) else {
            return Ok(unchanged(current));
        };

        let mut next = current.clone();
        let mut changes = ChangeSet::new();
        if let Some(followers) = next.followers.as_mut() {
            let removed = followers.remove(position);
            changes.element_deleted("followers", serde_json::to_value(&removed)?);
            if followers.is_empty() {
                next.followers = None;
            }
        }
        self.persist(&current, commit(&current, next, changes, ctx)?, ctx)
    }

    /// Record the latest connection test outcome.
    pub fn add_test_connection_result(
        &mut self,
        id: Uuid,
        mut result: TestConnectionResult,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        ensure_live(&current)?;
        if result.last_updated_at.is_none() {
            result.last_updated_at = Some((self.clock)());
        }

        let mut next = current.clone();
        let mut changes = ChangeSet::new();
        changes.apply(
            "testConnectionResult",
            &mut next.test_connection_result,
            FieldPatch::Set(result),
        )?;
        self.persist(&current, commit(&current, next, changes, ctx)?, ctx)
    }

    /// Launch the service's server, run one test step per call and record
    /// the outcome. A failing server still yields a recorded result.
    pub fn test_connection<C: McpConnector>(
        &mut self,
        id: Uuid,
        connector: &C,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        ensure_live(&current)?;
        let report = discovery::discover(connector, launch_config(&current)?);
        tracing::info!(
            service = %current.fully_qualified_name,
            passed = report.passed(),
            "Tested connection"
        );
        self.add_test_connection_result(id, report.result, ctx)
    }

    /// Replace the capability lists with what the live server reports.
    ///
    /// Goes through [`CatalogService::update`] based on the version read
    /// before launching, so a concurrent edit turns into `Conflict`. Lists
    /// the server failed to return are left as they are.
    pub fn discover_capabilities<C: McpConnector>(
        &mut self,
        id: Uuid,
        connector: &C,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        ensure_live(&current)?;
        let report = discovery::discover(connector, launch_config(&current)?);
        let Some(found) = report.discovered else {
            return Err(CatalogError::Connection(format!(
                "{ENTITY_TYPE} '{}': {}",
                current.fully_qualified_name,
                report.failure().unwrap_or("server did not initialize")
            )));
        };
        self.update(id, found.into_patch(), Some(current.version), ctx)
    }

    /// Replace the editable tags with the user's full `selected` set.
    ///
    /// The tier tag is managed by [`CatalogService::set_tier`] and survives
    /// untouched; tier tags in `selected` are ignored.
    pub fn update_tags(
        &mut self,
        id: Uuid,
        selected: &[TagSelection],
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        let (tier, editable) = split_tier(current.tags());

        let (tiers, selected): (Vec<TagSelection>, Vec<TagSelection>) =
            selected.iter().cloned().partition(TagSelection::is_tier);
        for ignored in &tiers {
            tracing::warn!(tag = %ignored.tag_fqn, "Ignoring tier tag in tag selection");
        }

        let tags = merge_tier(tier, reconcile_tags(&editable, &selected));
        self.update(id, tags_patch(tags), None, ctx)
    }

    /// Set or clear (`None`) the tier tag, keeping every other tag.
    pub fn set_tier(
        &mut self,
        id: Uuid,
        tier: Option<TagSelection>,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        if let Some(selection) = &tier {
            if !selection.is_tier() {
                return Err(CatalogError::validation(format!(
                    "'{}' is not a tier tag",
                    selection.tag_fqn
                )));
            }
        }

        let current = self.load(id)?;
        let (existing, editable) = split_tier(current.tags());
        let next_tier = tier.map(|selection| match existing {
            Some(label) if label.tag_fqn == selection.tag_fqn => label,
            _ => selection.into_label(),
        });

        self.update(id, tags_patch(merge_tier(next_tier, editable)), None, ctx)
    }

    fn load(&self, id: Uuid) -> CatalogResult<McpService> {
        self.store
            .get(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("{ENTITY_TYPE} {id}")))
    }

    fn apply_patch(
        &mut self,
        current: &McpService,
        patch: McpServicePatch,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let update = apply_update(current, patch, ctx, self.settings.duplicate_policy)?;
        self.persist(current, update, ctx)
    }

    fn set_deleted(
        &mut self,
        id: Uuid,
        deleted: bool,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let current = self.load(id)?;
        let mut next = current.clone();
        let mut changes = ChangeSet::new();
        let mut flag = current.is_deleted();
        changes.replace("deleted", &mut flag, deleted)?;
        if !changes.is_empty() {
            next.deleted = Some(deleted);
        }
        self.persist(&current, commit(&current, next, changes, ctx)?, ctx)
    }

    fn persist(
        &mut self,
        current: &McpService,
        update: Update,
        ctx: &MutationContext,
    ) -> CatalogResult<Update> {
        let Some(change) = &update.change else {
            return Ok(update);
        };
        self.store.replace(update.entity.clone(), current.version)?;
        tracing::info!(
            service = %update.entity.fully_qualified_name,
            from = %current.version,
            to = %update.entity.version,
            fields = ?change.changed_fields(),
            user = %ctx.user,
            "Updated service"
        );
        Ok(update)
    }
}

/// Soft-deleted services are read-only until restored.
fn ensure_live(service: &McpService) -> CatalogResult<()> {
    if service.is_deleted() {
        return Err(CatalogError::validation(format!(
            "{ENTITY_TYPE} '{}' is deleted and cannot be modified",
            service.fully_qualified_name
        )));
    }
    Ok(())
}

fn launch_config(service: &McpService) -> CatalogResult<&McpServerConfig> {
    service
        .connection
        .as_ref()
        .and_then(|c| c.server_config())
        .filter(|s| !s.command.trim().is_empty())
        .ok_or_else(|| {
            CatalogError::validation(format!(
                "{ENTITY_TYPE} '{}' has no server command to launch",
                service.fully_qualified_name
            ))
        })
}

fn unchanged(entity: McpService) -> Update {
    Update {
        entity,
        change: None,
    }
}

fn tags_patch(tags: Vec<crate::tags::TagLabel>) -> McpServicePatch {
    McpServicePatch {
        tags: if tags.is_empty() {
            FieldPatch::Clear
        } else {
            FieldPatch::Set(tags)
        },
        ..McpServicePatch::default()
    }
}
