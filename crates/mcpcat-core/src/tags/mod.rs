//! Tag labels attached to catalog entities.

pub mod reconcile;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

pub use reconcile::{TagSelection, merge_tier, reconcile_tags, split_tier};

/// Prefix of the classification that holds tier tags.
pub const TIER_PREFIX: &str = "Tier.";

/// How a tag ended up on the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    Automated,
    Derived,
    Generated,
    Manual,
    Propagated,
}

/// Where the tag is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSource {
    Classification,
    Glossary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagState {
    Confirmed,
    Suggested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, rename = "iconURL", skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A classification or glossary tag attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagLabel {
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    pub label_type: LabelType,
    pub source: TagSource,
    pub state: TagState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TagStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl TagLabel {
    /// A tag applied by a user: manual and confirmed.
    pub fn manual(tag_fqn: impl Into<String>, source: TagSource) -> Self {
        Self {
            tag_fqn: tag_fqn.into(),
            label_type: LabelType::Manual,
            source,
            state: TagState::Confirmed,
            name: None,
            display_name: None,
            description: None,
            style: None,
            href: None,
        }
    }

    pub fn is_tier(&self) -> bool {
        self.tag_fqn.starts_with(TIER_PREFIX)
    }
}

/// Reject tag lists holding the same `tagFQN` twice.
pub fn validate_unique(tags: &[TagLabel]) -> CatalogResult<()> {
    let mut seen = HashSet::new();
    for tag in tags {
        if tag.tag_fqn.trim().is_empty() {
            return Err(CatalogError::validation("tagFQN must not be empty"));
        }
        if !seen.insert(tag.tag_fqn.as_str()) {
            return Err(CatalogError::validation(format!(
                "duplicate tag '{}'",
                tag.tag_fqn
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_label_wire_names() {
        let tag = TagLabel::manual("PII.Sensitive", TagSource::Classification);
        let value = serde_json::to_value(&tag).unwrap();
        assert_eq!(value["tagFQN"], "PII.Sensitive");
        assert_eq!(value["labelType"], "Manual");
        assert_eq!(value["state"], "Confirmed");
        assert!(value.get("style").is_none());
    }

    #[test]
    fn duplicate_tag_fqn_is_rejected() {
        let tags = vec![
            TagLabel::manual("PII.Sensitive", TagSource::Classification),
            TagLabel::manual("PII.Sensitive", TagSource::Glossary),
        ];
        assert!(validate_unique(&tags).is_err());
        assert!(validate_unique(&tags[..1]).is_ok());
    }

    #[test]
    fn tier_detection() {
        assert!(TagLabel::manual("Tier.Tier1", TagSource::Classification).is_tier());
        assert!(!TagLabel::manual("Tiered.Thing", TagSource::Classification).is_tier());
    }
}
