//! Field-level diff accumulation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{ChangeDescription, ChangeSummary, FieldChange, MutationContext};
use crate::error::CatalogResult;
use crate::service::patch::FieldPatch;
use crate::types::EntityVersion;

/// Size of the version step a change warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum UpdateKind {
    /// Compatible change: `+0.1`.
    #[default]
    Minor,
    /// Breaking change for consumers: `+1.0`.
    Major,
}

impl UpdateKind {
    pub fn next_version(self, current: EntityVersion) -> Option<EntityVersion> {
        match self {
            UpdateKind::Minor => current.next_minor(),
            UpdateKind::Major => current.next_major(),
        }
    }
}

/// Changes collected while applying a patch.
///
/// Each field lands in at most one bucket per transition.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    added: Vec<FieldChange>,
    updated: Vec<FieldChange>,
    deleted: Vec<FieldChange>,
    kind: UpdateKind,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    /// Raise the version step; never lowers it.
    pub fn escalate(&mut self, kind: UpdateKind) {
        self.kind = self.kind.max(kind);
    }

    /// Apply a tri-state patch to an optional field, recording the diff.
    pub fn apply<T>(&mut self, name: &str, slot: &mut Option<T>, patch: FieldPatch<T>) -> CatalogResult<()>
    where
        T: Serialize + PartialEq,
    {
        match patch {
            FieldPatch::Keep => {}
            FieldPatch::Clear => {
                if let Some(old) = slot.take() {
                    self.deleted.push(FieldChange {
                        name: name.to_string(),
                        old_value: Some(serde_json::to_value(&old)?),
                        new_value: None,
                    });
                }
            }
            FieldPatch::Set(new) => match slot {
                None => {
                    self.added.push(FieldChange {
                        name: name.to_string(),
                        old_value: None,
                        new_value: Some(serde_json::to_value(&new)?),
                    });
                    *slot = Some(new);
                }
                Some(old) if *old != new => {
                    self.updated.push(FieldChange {
                        name: name.to_string(),
                        old_value: Some(serde_json::to_value(&*old)?),
                        new_value: Some(serde_json::to_value(&new)?),
                    });
                    *slot = Some(new);
                }
                Some(_) => {}
            },
        }
        Ok(())
    }

    /// Set a required field, recording an update when the value differs.
    pub fn replace<T>(&mut self, name: &str, slot: &mut T, new: T) -> CatalogResult<()>
    where
        T: Serialize + PartialEq,
    {
        if *slot != new {
            self.updated.push(FieldChange {
                name: name.to_string(),
                old_value: Some(serde_json::to_value(&*slot)?),
                new_value: Some(serde_json::to_value(&new)?),
            });
            *slot = new;
        }
        Ok(())
    }

    /// Record an element added to a collection field.
    pub fn element_added(&mut self, name: &str, value: Value) {
        self.added.push(FieldChange {
            name: name.to_string(),
            old_value: None,
            new_value: Some(value),
        });
    }

    /// Record an element removed from a collection field.
    pub fn element_deleted(&mut self, name: &str, value: Value) {
        self.deleted.push(FieldChange {
            name: name.to_string(),
            old_value: Some(value),
            new_value: None,
        });
    }

    /// Names of changed fields, in bucket order.
    pub fn fields(&self) -> Vec<&str> {
        self.added
            .iter()
            .chain(&self.updated)
            .chain(&self.deleted)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Finish the set into the change description of the next version.
    pub fn into_description(
        self,
        previous_version: EntityVersion,
        ctx: &MutationContext,
    ) -> ChangeDescription {
        let summary: BTreeMap<String, ChangeSummary> = self
            .fields()
            .into_iter()
            .map(|field| {
                (
                    field.to_string(),
                    ChangeSummary {
                        changed_at: Some(ctx.at),
                        changed_by: Some(ctx.user.clone()),
                        change_source: Some(ctx.source),
                    },
                )
            })
            .collect();

        fn bucket(changes: Vec<FieldChange>) -> Option<Vec<FieldChange>> {
            (!changes.is_empty()).then_some(changes)
        }

        ChangeDescription {
            fields_added: bucket(self.added),
            fields_updated: bucket(self.updated),
            fields_deleted: bucket(self.deleted),
            previous_version: Some(previous_version),
            change_summary: (!summary.is_empty()).then_some(summary),
        }
    }
}
