//! Stdio JSON-RPC client for a locally launched MCP server.
//!
//! The server is spawned from its [`McpServerConfig`] and spoken to in
//! newline-delimited JSON over its stdin and stdout. A reader thread turns
//! stdout lines into messages; requests wait for the response carrying
//! their id and skip anything else the server sends in between.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{McpPrompt, McpResource, McpServerConfig, McpTool};

/// Protocol revision offered in the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the server reported about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub server_info: Option<Value>,
    /// Capability objects keyed by `tools`, `resources`, `prompts`, ...
    #[serde(default)]
    pub capabilities: Option<Value>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl ServerInfo {
    pub fn name(&self) -> Option<&str> {
        self.server_info.as_ref()?.get("name")?.as_str()
    }

    /// Whether the server advertises `capability`. Servers that send no
    /// capabilities object are assumed to support everything.
    pub fn advertises(&self, capability: &str) -> bool {
        match &self.capabilities {
            Some(Value::Object(map)) => map.contains_key(capability),
            _ => true,
        }
    }
}

/// A session with one MCP server.
pub trait McpClient {
    fn initialize(&mut self) -> Result<ServerInfo>;
    fn list_tools(&mut self) -> Result<Vec<McpTool>>;
    fn list_resources(&mut self) -> Result<Vec<McpResource>>;
    fn list_prompts(&mut self) -> Result<Vec<McpPrompt>>;
}

/// Opens sessions for a server launch configuration.
pub trait McpConnector {
    type Client: McpClient;

    fn connect(&self, config: &McpServerConfig) -> Result<Self::Client>;
}

/// Launches servers as child processes.
#[derive(Debug, Clone, Copy)]
pub struct StdioConnector {
    pub timeout: Duration,
}

impl Default for StdioConnector {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl McpConnector for StdioConnector {
    type Client = StdioClient;

    fn connect(&self, config: &McpServerConfig) -> Result<StdioClient> {
        StdioClient::spawn(config, self.timeout)
    }
}

struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    messages: Receiver<Value>,
    reader: Option<JoinHandle<()>>,
}

impl StdioTransport {
    fn spawn(config: &McpServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(config.args.iter().flatten())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        // Added on top of the inherited environment so PATH lookups keep working.
        if let Some(env) = &config.env {
            cmd.envs(env);
        }
        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn MCP server: {}", config.command_line()))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("MCP server '{}' has no stdio pipes", config.command);
        };

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || reader_loop(stdout, tx));
        tracing::debug!(command = %config.command, pid = child.id(), "Spawned MCP server");

        Ok(Self {
            child,
            stdin,
            messages: rx,
            reader: Some(reader),
        })
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        let json = serde_json::to_string(message)?;
        writeln!(self.stdin, "{json}").context("Failed to write to MCP server stdin")?;
        self.stdin
            .flush()
            .context("Failed to flush MCP server stdin")?;
        Ok(())
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

fn reader_loop(stdout: ChildStdout, tx: Sender<Value>) {
    for line in BufReader::new(stdout).lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(message) => {
                if tx.send(message).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, line = %line, "Ignoring non-JSON output from MCP server"),
        }
    }
}

/// JSON-RPC session over a spawned server's stdio.
pub struct StdioClient {
    transport: StdioTransport,
    timeout: Duration,
    next_id: u64,
}

impl StdioClient {
    pub fn spawn(config: &McpServerConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: StdioTransport::spawn(config)?,
            timeout,
            next_id: 0,
        })
    }

    fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        self.transport.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let message = match self.transport.messages.recv_timeout(remaining) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    anyhow::bail!("'{method}' timed out after {:?}", self.timeout)
                }
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("MCP server exited before answering '{method}'")
                }
            };
            if message.get("id").and_then(Value::as_u64) != Some(id) {
                tracing::trace!(method, message = %message, "Skipping unrelated message");
                continue;
            }
            if let Some(error) = message.get("error") {
                let text = error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                anyhow::bail!("'{method}' failed: {text}");
            }
            return Ok(message.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    fn notify(&mut self, method: &str) -> Result<()> {
        self.transport.send(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": {},
        }))
    }

    /// Collect every page of a `*/list` method.
    fn list<T: DeserializeOwned>(&mut self, method: &str, key: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request(method, params)?;
            let page: Vec<T> =
                serde_json::from_value(result.get(key).cloned().unwrap_or_else(|| json!([])))
                    .with_context(|| format!("Malformed '{method}' response"))?;
            items.extend(page);

            let next = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            match next {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    anyhow::bail!("'{method}' returned the same cursor twice")
                }
                Some(next) => cursor = Some(next),
                None => return Ok(items),
            }
        }
    }
}

impl McpClient for StdioClient {
    fn initialize(&mut self) -> Result<ServerInfo> {
        let result = self.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "mcpcat", "version": env!("CARGO_PKG_VERSION")},
            }),
        )?;
        let info: ServerInfo =
            serde_json::from_value(result).context("Malformed 'initialize' response")?;
        self.notify("notifications/initialized")?;
        Ok(info)
    }

    fn list_tools(&mut self) -> Result<Vec<McpTool>> {
        self.list("tools/list", "tools")
    }

    fn list_resources(&mut self) -> Result<Vec<McpResource>> {
        self.list("resources/list", "resources")
    }

    fn list_prompts(&mut self) -> Result<Vec<McpPrompt>> {
        self.list("prompts/list", "prompts")
    }
}
