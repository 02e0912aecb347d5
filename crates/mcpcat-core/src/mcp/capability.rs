//! Capabilities exposed by an MCP server: tools, resources and prompts.
//!
//! Each list on the service is replaced as a whole on update. Identifier
//! uniqueness is not part of the wire schema, so duplicates are reported as
//! [`CapabilityIssue`]s and the configured [`DuplicatePolicy`] decides
//! whether they are fatal.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,
    /// Any additional example properties, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// JSON Schema for tool inputs; either a schema object or its string form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<ToolExample>>,
}

impl McpTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            input_schema: None,
            output_schema: None,
            examples: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResource {
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl McpResource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            description: None,
            mime_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpPromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub arg_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpPrompt {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<McpPromptArgument>>,
}

impl McpPrompt {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: None,
        }
    }

    pub fn with_argument(mut self, argument: McpPromptArgument) -> Self {
        self.arguments.get_or_insert_with(Vec::new).push(argument);
        self
    }
}

/// What to do with duplicate capability identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Log a warning and accept the list.
    #[default]
    Warn,
    /// Fail the request with a validation error.
    Reject,
}

impl TryFrom<&str> for DuplicatePolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "warn" => Ok(DuplicatePolicy::Warn),
            "reject" => Ok(DuplicatePolicy::Reject),
            _ => anyhow::bail!("Invalid duplicate policy: '{}'. Valid values: warn, reject", value),
        }
    }
}

/// An advisory problem in a capability list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityIssue {
    DuplicateToolName(String),
    DuplicatePromptName(String),
    DuplicateResourceUri(String),
    /// Resource URI that does not parse as a URL.
    InvalidResourceUri(String),
}

impl CapabilityIssue {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, CapabilityIssue::InvalidResourceUri(_))
    }
}

impl fmt::Display for CapabilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateToolName(name) => write!(f, "duplicate tool name '{name}'"),
            Self::DuplicatePromptName(name) => write!(f, "duplicate prompt name '{name}'"),
            Self::DuplicateResourceUri(uri) => write!(f, "duplicate resource uri '{uri}'"),
            Self::InvalidResourceUri(uri) => write!(f, "resource uri '{uri}' is not a valid URL"),
        }
    }
}

/// Reject capability entries missing their identifier.
pub fn validate_required(
    tools: Option<&[McpTool]>,
    resources: Option<&[McpResource]>,
    prompts: Option<&[McpPrompt]>,
) -> CatalogResult<()> {
    if tools.into_iter().flatten().any(|t| t.name.trim().is_empty()) {
        return Err(CatalogError::validation("availableTools[].name is required"));
    }
    if resources.into_iter().flatten().any(|r| r.uri.trim().is_empty()) {
        return Err(CatalogError::validation("availableResources[].uri is required"));
    }
    for prompt in prompts.into_iter().flatten() {
        if prompt.name.trim().is_empty() {
            return Err(CatalogError::validation("availablePrompts[].name is required"));
        }
        if prompt
            .arguments
            .iter()
            .flatten()
            .any(|a| a.name.trim().is_empty())
        {
            return Err(CatalogError::validation(format!(
                "prompt '{}' has an argument without a name",
                prompt.name
            )));
        }
    }
    Ok(())
}

/// Collect advisory issues across the three capability lists.
pub fn check_capabilities(
    tools: Option<&[McpTool]>,
    resources: Option<&[McpResource]>,
    prompts: Option<&[McpPrompt]>,
) -> Vec<CapabilityIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for tool in tools.into_iter().flatten() {
        if !seen.insert(tool.name.as_str()) {
            issues.push(CapabilityIssue::DuplicateToolName(tool.name.clone()));
        }
    }

    let mut seen = HashSet::new();
    for resource in resources.into_iter().flatten() {
        if !seen.insert(resource.uri.as_str()) {
            issues.push(CapabilityIssue::DuplicateResourceUri(resource.uri.clone()));
        }
        if url::Url::parse(&resource.uri).is_err() {
            issues.push(CapabilityIssue::InvalidResourceUri(resource.uri.clone()));
        }
    }

    let mut seen = HashSet::new();
    for prompt in prompts.into_iter().flatten() {
        if !seen.insert(prompt.name.as_str()) {
            issues.push(CapabilityIssue::DuplicatePromptName(prompt.name.clone()));
        }
    }

    issues
}

/// Apply `policy` to a set of issues: warn about each, fail on duplicates
/// under [`DuplicatePolicy::Reject`].
pub fn enforce(issues: &[CapabilityIssue], policy: DuplicatePolicy) -> CatalogResult<()> {
    if policy == DuplicatePolicy::Reject {
        if let Some(issue) = issues.iter().find(|i| i.is_duplicate()) {
            return Err(CatalogError::validation(issue.to_string()));
        }
    }
    for issue in issues {
        tracing::warn!(%issue, "Capability list issue");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_duplicate_tool_names() {
        let tools = vec![McpTool::new("search"), McpTool::new("search")];
        let issues = check_capabilities(Some(&tools), None, None);
        assert_eq!(issues, vec![CapabilityIssue::DuplicateToolName("search".into())]);
    }

    #[test]
    fn flags_duplicate_prompt_names_and_resource_uris() {
        let resources = vec![
            McpResource::new("file:///docs"),
            McpResource::new("file:///docs"),
        ];
        let prompts = vec![McpPrompt::new("summarize"), McpPrompt::new("summarize")];
        let issues = check_capabilities(None, Some(&resources), Some(&prompts));
        assert!(issues.contains(&CapabilityIssue::DuplicateResourceUri("file:///docs".into())));
        assert!(issues.contains(&CapabilityIssue::DuplicatePromptName("summarize".into())));
    }

    #[test]
    fn relative_uri_is_only_advisory() {
        let resources = vec![McpResource::new("docs/readme.md")];
        let issues = check_capabilities(None, Some(&resources), None);
        assert_eq!(
            issues,
            vec![CapabilityIssue::InvalidResourceUri("docs/readme.md".into())]
        );
        assert!(enforce(&issues, DuplicatePolicy::Reject).is_ok());
    }

    #[test]
    fn reject_policy_fails_on_duplicates() {
        let issues = vec![CapabilityIssue::DuplicateToolName("search".into())];
        assert!(enforce(&issues, DuplicatePolicy::Warn).is_ok());
        let err = enforce(&issues, DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("duplicate tool name 'search'"));
    }

    #[test]
    fn missing_identifiers_are_rejected() {
        let tools = vec![McpTool::new("")];
        assert!(validate_required(Some(&tools), None, None).is_err());
        let resources = vec![McpResource::new(" ")];
        assert!(validate_required(None, Some(&resources), None).is_err());
        let prompts = vec![McpPrompt::new("p").with_argument(McpPromptArgument {
            name: String::new(),
            description: None,
            arg_type: None,
            required: None,
        })];
        assert!(validate_required(None, None, Some(&prompts)).is_err());
    }

    #[test]
    fn tool_example_keeps_extra_properties() {
        let json = r#"{"description":"d","input":{"q":"x"},"note":"kept"}"#;
        let example: ToolExample = serde_json::from_str(json).unwrap();
        assert_eq!(example.extra.get("note"), Some(&Value::from("kept")));
        let back = serde_json::to_value(&example).unwrap();
        assert_eq!(back["note"], "kept");
        assert!(back.get("output").is_none());
    }

    #[test]
    fn input_schema_accepts_string_or_object() {
        let as_string: McpTool =
            serde_json::from_str(r#"{"name":"a","inputSchema":"{\"type\":\"object\"}"}"#).unwrap();
        assert!(as_string.input_schema.unwrap().is_string());
        let as_object: McpTool =
            serde_json::from_str(r#"{"name":"a","inputSchema":{"type":"object"}}"#).unwrap();
        assert!(as_object.input_schema.unwrap().is_object());
    }
}
