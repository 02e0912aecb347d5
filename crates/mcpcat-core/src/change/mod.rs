//! Change descriptions: the audit record attached to each version transition.

pub mod diff;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{EntityVersion, now_millis};

pub use diff::{ChangeSet, UpdateKind};

/// Who or what produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSource {
    Automated,
    Derived,
    Ingested,
    Manual,
    Propagated,
    Suggested,
}

/// A single field-level diff entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_source: Option<ChangeSource>,
}

/// Field-level diff that produced the current version from `previous_version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_added: Option<Vec<FieldChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_updated: Option<Vec<FieldChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_deleted: Option<Vec<FieldChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<EntityVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<BTreeMap<String, ChangeSummary>>,
}

impl ChangeDescription {
    pub fn added(&self) -> &[FieldChange] {
        self.fields_added.as_deref().unwrap_or_default()
    }

    pub fn updated(&self) -> &[FieldChange] {
        self.fields_updated.as_deref().unwrap_or_default()
    }

    pub fn deleted(&self) -> &[FieldChange] {
        self.fields_deleted.as_deref().unwrap_or_default()
    }

    /// Names of every field touched by this change.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.added()
            .iter()
            .chain(self.updated())
            .chain(self.deleted())
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Who is mutating, when, and through which channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationContext {
    pub user: String,
    pub source: ChangeSource,
    pub at: i64,
}

impl MutationContext {
    /// A manual change by `user`, stamped now.
    pub fn manual(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            source: ChangeSource::Manual,
            at: now_millis(),
        }
    }

    pub fn with_source(mut self, source: ChangeSource) -> Self {
        self.source = source;
        self
    }

    pub fn at(mut self, at: i64) -> Self {
        self.at = at;
        self
    }
}
