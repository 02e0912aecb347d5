//! Tag-set reconciliation for user tag selections.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{TagLabel, TagSource, TagStyle};

/// A tag picked by a user, before it becomes a [`TagLabel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSelection {
    #[serde(rename = "tagFQN")]
    pub tag_fqn: String,
    pub source: TagSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TagStyle>,
}

impl TagSelection {
    pub fn new(tag_fqn: impl Into<String>, source: TagSource) -> Self {
        Self {
            tag_fqn: tag_fqn.into(),
            source,
            name: None,
            display_name: None,
            description: None,
            style: None,
        }
    }

    pub fn is_tier(&self) -> bool {
        self.tag_fqn.starts_with(super::TIER_PREFIX)
    }

    /// Label for a freshly applied tag.
    pub fn into_label(self) -> TagLabel {
        TagLabel {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            style: self.style,
            ..TagLabel::manual(self.tag_fqn, self.source)
        }
    }
}

impl From<&TagLabel> for TagSelection {
    fn from(tag: &TagLabel) -> Self {
        Self {
            tag_fqn: tag.tag_fqn.clone(),
            source: tag.source,
            name: tag.name.clone(),
            display_name: tag.display_name.clone(),
            description: tag.description.clone(),
            style: tag.style.clone(),
        }
    }
}

/// Compute the tag set to persist for a full desired `selected` set.
///
/// Tags already present in `current` keep their label type and state; new
/// tags are manual and confirmed; tags missing from `selected` are dropped.
/// Kept tags come first in their current order, followed by new tags in
/// selection order.
pub fn reconcile_tags(current: &[TagLabel], selected: &[TagSelection]) -> Vec<TagLabel> {
    let wanted: HashSet<&str> = selected.iter().map(|s| s.tag_fqn.as_str()).collect();

    let mut result: Vec<TagLabel> = current
        .iter()
        .filter(|tag| wanted.contains(tag.tag_fqn.as_str()))
        .cloned()
        .collect();

    let mut present: HashSet<String> = result.iter().map(|t| t.tag_fqn.clone()).collect();
    for selection in selected {
        if present.insert(selection.tag_fqn.clone()) {
            result.push(selection.clone().into_label());
        }
    }

    result
}

/// Separate the tier tag from the editable tags.
///
/// Returns the first tier tag found, and every non-tier tag in order.
pub fn split_tier(tags: &[TagLabel]) -> (Option<TagLabel>, Vec<TagLabel>) {
    let tier = tags.iter().find(|t| t.is_tier()).cloned();
    let editable = tags.iter().filter(|t| !t.is_tier()).cloned().collect();
    (tier, editable)
}

/// Put a tier tag back after the editable tags.
pub fn merge_tier(tier: Option<TagLabel>, mut editable: Vec<TagLabel>) -> Vec<TagLabel> {
    editable.extend(tier);
    editable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{LabelType, TagState};

    fn derived(fqn: &str) -> TagLabel {
        TagLabel {
            label_type: LabelType::Derived,
            state: TagState::Suggested,
            ..TagLabel::manual(fqn, TagSource::Classification)
        }
    }

    #[test]
    fn keeps_existing_and_creates_new_as_manual_confirmed() {
        let current = vec![derived("PII.Sensitive")];
        let selected = vec![
            TagSelection::new("PII.Sensitive", TagSource::Classification),
            TagSelection::new("Tier.Tier1", TagSource::Classification),
        ];

        let result = reconcile_tags(&current, &selected);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], current[0]);
        assert_eq!(result[1].tag_fqn, "Tier.Tier1");
        assert_eq!(result[1].label_type, LabelType::Manual);
        assert_eq!(result[1].state, TagState::Confirmed);
        assert_eq!(result[1].source, TagSource::Classification);
    }

    #[test]
    fn drops_tags_missing_from_selection() {
        let current = vec![derived("PII.Sensitive"), derived("PersonalData.Personal")];
        let selected = vec![TagSelection::new(
            "PersonalData.Personal",
            TagSource::Classification,
        )];

        let result = reconcile_tags(&current, &selected);

        assert_eq!(result, vec![current[1].clone()]);
    }

    #[test]
    fn preserves_glossary_source_for_new_tags() {
        let selected = vec![TagSelection::new("Business.Revenue", TagSource::Glossary)];
        let result = reconcile_tags(&[], &selected);
        assert_eq!(result[0].source, TagSource::Glossary);
    }

    #[test]
    fn duplicate_selections_collapse() {
        let selected = vec![
            TagSelection::new("A.b", TagSource::Classification),
            TagSelection::new("A.b", TagSource::Classification),
        ];
        assert_eq!(reconcile_tags(&[], &selected).len(), 1);
    }

    #[test]
    fn empty_selection_clears_everything() {
        let current = vec![derived("PII.Sensitive")];
        assert!(reconcile_tags(&current, &[]).is_empty());
    }

    #[test]
    fn split_and_merge_tier() {
        let tags = vec![
            derived("Tier.Tier2"),
            derived("PII.Sensitive"),
        ];
        let (tier, editable) = split_tier(&tags);
        assert_eq!(tier.as_ref().map(|t| t.tag_fqn.as_str()), Some("Tier.Tier2"));
        assert_eq!(editable.len(), 1);

        let merged = merge_tier(tier, editable);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].tag_fqn, "Tier.Tier2");
    }
}
