//! Partial updates to an MCP service.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::ServiceType;
use crate::mcp::{McpConnection, McpPrompt, McpResource, McpTool};
use crate::tags::TagLabel;
use crate::types::EntityReference;

/// Tri-state field update.
///
/// On the wire an absent key is [`FieldPatch::Keep`], `null` is
/// [`FieldPatch::Clear`] and any other value is [`FieldPatch::Set`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldPatch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldPatch::Keep)
    }

    /// `Set` for `Some`, `Keep` for `None`.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldPatch::Set(v),
            None => FieldPatch::Keep,
        }
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldPatch::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for FieldPatch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldPatch::Set(v) => v.serialize(serializer),
            FieldPatch::Keep | FieldPatch::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldPatch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => FieldPatch::Set(v),
            None => FieldPatch::Clear,
        })
    }
}

/// A partial update. Fields left as `Keep` are untouched.
///
/// `id` and `service_type` are immutable; they may be present only with the
/// entity's current values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub name: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub display_name: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub description: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub server_instructions: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub connection: FieldPatch<McpConnection>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub available_tools: FieldPatch<Vec<McpTool>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub available_resources: FieldPatch<Vec<McpResource>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub available_prompts: FieldPatch<Vec<McpPrompt>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub tags: FieldPatch<Vec<TagLabel>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub owners: FieldPatch<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub domains: FieldPatch<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub data_products: FieldPatch<Vec<EntityReference>>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_keep")]
    pub pipelines: FieldPatch<Vec<EntityReference>>,
}

impl McpServicePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the patch mentions no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
