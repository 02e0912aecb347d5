//! Declarative form schemas for editing MCP services.
//!
//! The mapping is static data: one `{schema, uiSchema}` pair per connection
//! discriminant, consumed by an external JSON-Schema form renderer.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use super::schema::McpType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub schema: Value,
    pub ui_schema: Value,
}

/// Form schema for a connection discriminant.
pub fn form_schema(mcp_type: McpType) -> FormSchema {
    match mcp_type {
        McpType::Mcp => mcp_form_schema(),
    }
}

/// Form schema by discriminant string; `None` for unknown kinds.
pub fn form_schema_for(kind: &str) -> Option<FormSchema> {
    McpType::ALL
        .iter()
        .find(|t| t.as_str() == kind)
        .map(|t| form_schema(*t))
}

/// Every supported discriminant with its form schema.
pub fn form_schemas() -> BTreeMap<McpType, FormSchema> {
    McpType::ALL
        .iter()
        .map(|t| (*t, form_schema(*t)))
        .collect()
}

fn mcp_form_schema() -> FormSchema {
    let kind = McpType::Mcp.as_str();
    let schema = json!({
        "type": "object",
        "properties": {
            "type": {
                "title": "Service Type",
                "type": "string",
                "enum": [kind],
                "default": kind,
            },
            "connection": {
                "type": "object",
                "title": "MCP Service Connection",
                "properties": {
                    "config": {
                        "type": "object",
                        "title": "Server Configuration",
                        "properties": {
                            "command": {
                                "type": "string",
                                "title": "Command",
                                "description": "Command to run the MCP server (e.g., npx, node, python)",
                            },
                            "args": {
                                "type": "array",
                                "title": "Arguments",
                                "description": "Arguments to pass to the command",
                                "items": { "type": "string" },
                            },
                            "env": {
                                "type": "object",
                                "title": "Environment Variables",
                                "description": "Environment variables to set when running the server",
                                "additionalProperties": { "type": "string" },
                            },
                            "cwd": {
                                "type": "string",
                                "title": "Working Directory",
                                "description": "Working directory for the server process",
                            },
                        },
                        "required": ["command"],
                    },
                },
                "required": ["config"],
            },
            "availableTools": {
                "type": "array",
                "title": "Available Tools",
                "description": "Tools provided by this MCP server",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "title": "Tool Name" },
                        "description": { "type": "string", "title": "Tool Description" },
                        "category": { "type": "string", "title": "Category" },
                        "inputSchema": {
                            "type": "object",
                            "title": "Input Schema",
                            "description": "JSON Schema for tool inputs",
                        },
                    },
                    "required": ["name"],
                },
            },
            "availableResources": {
                "type": "array",
                "title": "Available Resources",
                "description": "Resources provided by this MCP server",
                "items": {
                    "type": "object",
                    "properties": {
                        "uri": { "type": "string", "title": "URI" },
                        "name": { "type": "string", "title": "Resource Name" },
                        "description": { "type": "string", "title": "Resource Description" },
                        "mimeType": { "type": "string", "title": "MIME Type" },
                    },
                    "required": ["uri", "name"],
                },
            },
            "availablePrompts": {
                "type": "array",
                "title": "Available Prompts",
                "description": "Prompts provided by this MCP server",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "title": "Prompt Name" },
                        "description": { "type": "string", "title": "Prompt Description" },
                        "arguments": {
                            "type": "object",
                            "title": "Arguments",
                            "description": "Arguments for the prompt",
                        },
                    },
                    "required": ["name"],
                },
            },
            "serverInstructions": {
                "type": "string",
                "title": "Server Instructions",
                "description": "Instructions for using this MCP server",
            },
        },
        "required": ["type", "connection"],
    });

    let ui_schema = json!({
        "type": { "ui:widget": "hidden" },
        "connection": {
            "config": {
                "command": { "ui:placeholder": "e.g., npx, node, python" },
                "args": { "ui:placeholder": "e.g., -y, @modelcontextprotocol/server-everything" },
                "cwd": { "ui:placeholder": "/path/to/server/directory" },
            },
        },
        "serverInstructions": {
            "ui:widget": "textarea",
            "ui:rows": 4,
        },
    });

    FormSchema { schema, ui_schema }
}
