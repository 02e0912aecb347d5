//! Import services from a desktop-client `mcpServers` config.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CatalogResult;
use crate::mcp::{McpConnection, McpServerConfig};
use crate::service::CreateMcpService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    #[serde(default)]
    mcp_servers: BTreeMap<String, ClientServerEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientServerEntry {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(default)]
    env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Turn `{"mcpServers": {name: {command, args, env, cwd}}}` into create
/// requests, sorted by name.
///
/// Entries without a command (remote `url` servers) cannot be launched and
/// are skipped.
pub fn parse_client_config(json: &str) -> CatalogResult<Vec<CreateMcpService>> {
    let config: ClientConfig = serde_json::from_str(json)?;

    let mut requests = Vec::with_capacity(config.mcp_servers.len());
    for (name, entry) in config.mcp_servers {
        let Some(command) = entry.command.filter(|c| !c.trim().is_empty()) else {
            tracing::warn!(
                server = %name,
                url = entry.url.as_deref().unwrap_or("-"),
                "Skipping server without a command"
            );
            continue;
        };

        let server = McpServerConfig {
            command,
            args: entry.args,
            env: entry.env,
            cwd: entry.cwd,
        };
        requests.push(CreateMcpService::new(name, McpConnection::new(server)));
    }

    tracing::debug!(count = requests.len(), "Parsed client config");
    Ok(requests)
}
