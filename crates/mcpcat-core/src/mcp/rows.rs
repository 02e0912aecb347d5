//! Flat table rows for displaying capability lists.

use serde::Serialize;

use super::capability::{McpPrompt, McpResource, McpTool};

const NONE_MARK: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRow {
    pub name: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRow {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRow {
    pub name: String,
    pub description: String,
    pub arguments: String,
}

pub fn tool_rows(tools: &[McpTool]) -> Vec<ToolRow> {
    tools
        .iter()
        .map(|tool| ToolRow {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            category: tool
                .category
                .clone()
                .unwrap_or_else(|| NONE_MARK.to_string()),
        })
        .collect()
}

pub fn resource_rows(resources: &[McpResource]) -> Vec<ResourceRow> {
    resources
        .iter()
        .map(|resource| ResourceRow {
            name: resource
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unnamed".to_string()),
            uri: resource.uri.clone(),
            mime_type: resource
                .mime_type
                .clone()
                .unwrap_or_else(|| NONE_MARK.to_string()),
            description: resource.description.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn prompt_rows(prompts: &[McpPrompt]) -> Vec<PromptRow> {
    prompts
        .iter()
        .map(|prompt| PromptRow {
            name: prompt.name.clone(),
            description: prompt.description.clone().unwrap_or_default(),
            arguments: summarize_arguments(prompt),
        })
        .collect()
}

/// `name (type) [required]` per argument, comma separated.
fn summarize_arguments(prompt: &McpPrompt) -> String {
    let args = match prompt.arguments.as_deref() {
        Some(args) if !args.is_empty() => args,
        _ => return NONE_MARK.to_string(),
    };

    args.iter()
        .map(|arg| {
            let mut out = arg.name.clone();
            if let Some(arg_type) = &arg.arg_type {
                out.push_str(&format!(" ({arg_type})"));
            }
            if arg.required == Some(true) {
                out.push_str(" [required]");
            }
            out
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::capability::McpPromptArgument;

    #[test]
    fn tool_without_category_shows_dash() {
        let rows = tool_rows(&[McpTool::new("read_file").with_category("fs"), McpTool::new("x")]);
        assert_eq!(rows[0].category, "fs");
        assert_eq!(rows[1].category, "-");
        assert_eq!(rows[1].description, "");
    }

    #[test]
    fn resource_without_name_is_unnamed() {
        let resource = McpResource {
            mime_type: Some("text/markdown".to_string()),
            ..McpResource::new("file:///kb")
        };
        let rows = resource_rows(&[resource]);
        assert_eq!(rows[0].name, "Unnamed");
        assert_eq!(rows[0].mime_type, "text/markdown");
    }

    #[test]
    fn prompt_arguments_summary() {
        let prompt = McpPrompt::new("summarize")
            .with_argument(McpPromptArgument {
                name: "text".into(),
                description: None,
                arg_type: Some("string".into()),
                required: Some(true),
            })
            .with_argument(McpPromptArgument {
                name: "length".into(),
                description: None,
                arg_type: None,
                required: Some(false),
            });
        let rows = prompt_rows(&[prompt, McpPrompt::new("translate")]);
        assert_eq!(rows[0].arguments, "text (string) [required], length");
        assert_eq!(rows[1].arguments, "-");
    }
}
