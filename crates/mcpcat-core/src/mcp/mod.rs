//! MCP (Model Context Protocol) connection and capability model

pub mod capability;
pub mod client;
pub mod discovery;
pub mod form;
pub mod rows;
pub mod schema;

pub use capability::{
    CapabilityIssue, DuplicatePolicy, McpPrompt, McpPromptArgument, McpResource, McpTool,
    ToolExample,
};
pub use client::{McpClient, McpConnector, ServerInfo, StdioClient, StdioConnector};
pub use discovery::{Discovered, DiscoveryReport, discover};
pub use form::{FormSchema, form_schema, form_schema_for, form_schemas};
pub use schema::{McpConnection, McpConnectionConfig, McpServerConfig, McpType};
