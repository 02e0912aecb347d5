//! MCP connection configuration schema
//!
//! `connection.config` holds the connection discriminant plus the launch
//! configuration of a stdio MCP server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};
use crate::service::ServiceType;

/// Connection discriminant for MCP services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum McpType {
    Mcp,
}

impl McpType {
    pub const ALL: [McpType; 1] = [McpType::Mcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            McpType::Mcp => "Mcp",
        }
    }

    /// Human label used by service-type pickers.
    pub fn label(&self) -> &'static str {
        match self {
            McpType::Mcp => "MCP",
        }
    }

    /// The service type this connection kind belongs to.
    pub fn service_type(&self) -> ServiceType {
        match self {
            McpType::Mcp => ServiceType::Mcp,
        }
    }

    /// `(label, value)` pairs for a service-type select box.
    pub fn options() -> Vec<(&'static str, &'static str)> {
        Self::ALL.iter().map(|t| (t.label(), t.as_str())).collect()
    }
}

impl TryFrom<&str> for McpType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "mcp" => Ok(McpType::Mcp),
            _ => anyhow::bail!("Invalid MCP connection type: '{}'. Valid values: Mcp", value),
        }
    }
}

/// How to launch the MCP server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    /// Command to run the server (e.g. `npx`, `node`, `python`)
    #[serde(default)]
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    /// Working directory for the server process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl McpServerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Command followed by its arguments, for display.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.command.clone()];
        parts.extend(self.args.iter().flatten().cloned());
        parts.join(" ")
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.command.trim().is_empty() {
            return Err(CatalogError::validation(
                "connection.config.config.command is required",
            ));
        }
        if let Some(env) = &self.env {
            if env.keys().any(|k| k.trim().is_empty()) {
                return Err(CatalogError::validation(
                    "environment variable names must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// Typed connection payload: discriminant plus server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConnectionConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mcp_type: Option<McpType>,

    pub config: McpServerConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_options: Option<BTreeMap<String, String>>,

    /// Free-form arguments passed to the connection layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_arguments: Option<Map<String, Value>>,
}

impl McpConnectionConfig {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            mcp_type: Some(McpType::Mcp),
            config,
            connection_options: None,
            connection_arguments: None,
        }
    }
}

/// Connection wrapper stored on the service entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct McpConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<McpConnectionConfig>,
}

impl McpConnection {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config: Some(McpConnectionConfig::new(config)),
        }
    }

    pub fn server_config(&self) -> Option<&McpServerConfig> {
        self.config.as_ref().map(|c| &c.config)
    }

    /// Validate the connection for an entity of `service_type`.
    ///
    /// The discriminant, when present, must name the same service type.
    pub fn validate(&self, service_type: ServiceType) -> CatalogResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| CatalogError::validation("connection.config is required"))?;

        if let Some(mcp_type) = config.mcp_type {
            if mcp_type.service_type() != service_type {
                return Err(CatalogError::validation(format!(
                    "connection type '{}' does not match service type '{}'",
                    mcp_type.as_str(),
                    service_type.as_str()
                )));
            }
        }

        config.config.validate()
    }
}
