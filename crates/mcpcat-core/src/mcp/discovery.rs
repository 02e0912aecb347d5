//! Connection testing and capability discovery against a live server.
//!
//! One session runs `initialize` followed by the three list calls. Every
//! call becomes a [`TestConnectionStep`]; only the handshake and the tool
//! listing are mandatory. A list the server does not advertise is skipped
//! and counts as empty.

use super::client::{McpClient, McpConnector, ServerInfo};
use super::{McpPrompt, McpResource, McpServerConfig, McpTool};
use crate::service::{
    FieldPatch, McpServicePatch, TestConnectionResult, TestConnectionStatus, TestConnectionStep,
};

pub const STEP_INITIALIZE: &str = "Initialize";
pub const STEP_LIST_TOOLS: &str = "ListTools";
pub const STEP_LIST_RESOURCES: &str = "ListResources";
pub const STEP_LIST_PROMPTS: &str = "ListPrompts";

/// What a session read from the server. `None` lists could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovered {
    pub server: ServerInfo,
    pub tools: Option<Vec<McpTool>>,
    pub resources: Option<Vec<McpResource>>,
    pub prompts: Option<Vec<McpPrompt>>,
}

impl Discovered {
    /// Patch replacing the stored capability lists with the discovered ones.
    ///
    /// Lists that could not be read are kept; empty lists clear the field.
    /// Server instructions are only ever set, never cleared.
    pub fn into_patch(self) -> McpServicePatch {
        fn replace<T>(list: Option<Vec<T>>) -> FieldPatch<Vec<T>> {
            match list {
                None => FieldPatch::Keep,
                Some(items) if items.is_empty() => FieldPatch::Clear,
                Some(items) => FieldPatch::Set(items),
            }
        }

        McpServicePatch {
            available_tools: replace(self.tools),
            available_resources: replace(self.resources),
            available_prompts: replace(self.prompts),
            server_instructions: FieldPatch::from_option(
                self.server.instructions.filter(|i| !i.trim().is_empty()),
            ),
            ..McpServicePatch::default()
        }
    }
}

/// Outcome of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub result: TestConnectionResult,
    /// `None` when the server could not be launched or initialized.
    pub discovered: Option<Discovered>,
}

impl DiscoveryReport {
    pub fn passed(&self) -> bool {
        self.result.effective_status() == TestConnectionStatus::Successful
    }

    /// Error of the first failed mandatory step.
    pub fn failure(&self) -> Option<&str> {
        self.result
            .steps
            .iter()
            .find(|s| s.mandatory && !s.passed)
            .map(|s| s.error_log.as_deref().unwrap_or(s.name.as_str()))
    }
}

/// Launch the server described by `config` and run every step against it.
pub fn discover<C: McpConnector>(connector: &C, config: &McpServerConfig) -> DiscoveryReport {
    let mut steps = Vec::with_capacity(4);

    let session = connector
        .connect(config)
        .and_then(|mut client| client.initialize().map(|info| (client, info)));
    let (mut client, server) = match session {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(command = %config.command, error = %format!("{e:#}"), "MCP server did not initialize");
            steps.push(failed(STEP_INITIALIZE, true, &e));
            for (name, mandatory) in [
                (STEP_LIST_TOOLS, true),
                (STEP_LIST_RESOURCES, false),
                (STEP_LIST_PROMPTS, false),
            ] {
                steps.push(TestConnectionStep {
                    name: name.to_string(),
                    mandatory,
                    passed: false,
                    message: Some("Skipped: server did not initialize".to_string()),
                    error_log: None,
                });
            }
            return DiscoveryReport {
                result: finish(steps),
                discovered: None,
            };
        }
    };

    steps.push(TestConnectionStep {
        name: STEP_INITIALIZE.to_string(),
        mandatory: true,
        passed: true,
        message: Some(match (server.name(), &server.protocol_version) {
            (Some(name), Some(version)) => format!("Connected to '{name}' (protocol {version})"),
            (Some(name), None) => format!("Connected to '{name}'"),
            _ => "Connected".to_string(),
        }),
        error_log: None,
    });

    let tools = run_list(&mut steps, STEP_LIST_TOOLS, true, &server, "tools", || {
        client.list_tools()
    });
    let resources = run_list(&mut steps, STEP_LIST_RESOURCES, false, &server, "resources", || {
        client.list_resources()
    });
    let prompts = run_list(&mut steps, STEP_LIST_PROMPTS, false, &server, "prompts", || {
        client.list_prompts()
    });

    tracing::info!(
        command = %config.command,
        server = server.name().unwrap_or("-"),
        tools = tools.as_ref().map_or(0, Vec::len),
        resources = resources.as_ref().map_or(0, Vec::len),
        prompts = prompts.as_ref().map_or(0, Vec::len),
        "Discovered MCP capabilities"
    );

    DiscoveryReport {
        result: finish(steps),
        discovered: Some(Discovered {
            server,
            tools,
            resources,
            prompts,
        }),
    }
}

fn run_list<T>(
    steps: &mut Vec<TestConnectionStep>,
    name: &str,
    mandatory: bool,
    server: &ServerInfo,
    capability: &str,
    call: impl FnOnce() -> anyhow::Result<Vec<T>>,
) -> Option<Vec<T>> {
    if !server.advertises(capability) {
        steps.push(TestConnectionStep {
            name: name.to_string(),
            mandatory,
            passed: true,
            message: Some(format!("Server does not advertise {capability}")),
            error_log: None,
        });
        return Some(Vec::new());
    }

    match call() {
        Ok(items) => {
            steps.push(TestConnectionStep {
                name: name.to_string(),
                mandatory,
                passed: true,
                message: Some(format!("Found {} {capability}", items.len())),
                error_log: None,
            });
            Some(items)
        }
        Err(e) => {
            tracing::warn!(step = name, error = %format!("{e:#}"), "MCP list call failed");
            steps.push(failed(name, mandatory, &e));
            None
        }
    }
}

fn failed(name: &str, mandatory: bool, error: &anyhow::Error) -> TestConnectionStep {
    TestConnectionStep {
        name: name.to_string(),
        mandatory,
        passed: false,
        message: None,
        error_log: Some(format!("{error:#}")),
    }
}

fn finish(steps: Vec<TestConnectionStep>) -> TestConnectionResult {
    let mut result = TestConnectionResult {
        last_updated_at: None,
        status: None,
        steps,
    };
    result.status = Some(result.effective_status());
    result
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process stand-in for a server.

    use anyhow::{Result, anyhow};
    use serde_json::{Value, json};

    use super::super::client::{McpClient, McpConnector, ServerInfo};
    use super::super::{McpPrompt, McpResource, McpServerConfig, McpTool};

    #[derive(Debug, Clone)]
    pub struct FakeServer {
        pub refuse: bool,
        pub capabilities: Option<Value>,
        pub instructions: Option<String>,
        pub tools: Result<Vec<McpTool>, String>,
        pub resources: Result<Vec<McpResource>, String>,
        pub prompts: Result<Vec<McpPrompt>, String>,
    }

    impl FakeServer {
        pub fn new() -> Self {
            Self {
                refuse: false,
                capabilities: None,
                instructions: None,
                tools: Ok(Vec::new()),
                resources: Ok(Vec::new()),
                prompts: Ok(Vec::new()),
            }
        }
    }

    impl McpConnector for FakeServer {
        type Client = FakeServer;

        fn connect(&self, config: &McpServerConfig) -> Result<FakeServer> {
            if self.refuse {
                return Err(anyhow!("Failed to spawn MCP server: {}", config.command));
            }
            Ok(self.clone())
        }
    }

    impl McpClient for FakeServer {
        fn initialize(&mut self) -> Result<ServerInfo> {
            Ok(ServerInfo {
                protocol_version: Some("2024-11-05".to_string()),
                server_info: Some(json!({"name": "fake", "version": "1.0"})),
                capabilities: self.capabilities.clone(),
                instructions: self.instructions.clone(),
            })
        }

        fn list_tools(&mut self) -> Result<Vec<McpTool>> {
            self.tools.clone().map_err(|e| anyhow!(e))
        }

        fn list_resources(&mut self) -> Result<Vec<McpResource>> {
            self.resources.clone().map_err(|e| anyhow!(e))
        }

        fn list_prompts(&mut self) -> Result<Vec<McpPrompt>> {
            self.prompts.clone().map_err(|e| anyhow!(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeServer;
    use super::*;
    use serde_json::json;

    fn config() -> McpServerConfig {
        McpServerConfig::new("node").with_args(["mcp-server.js"])
    }

    fn step<'a>(report: &'a DiscoveryReport, name: &str) -> &'a TestConnectionStep {
        report.result.steps.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn healthy_server_passes_every_step() {
        let server = FakeServer {
            tools: Ok(vec![McpTool::new("read_file")]),
            resources: Ok(vec![McpResource::new("file:///tmp")]),
            prompts: Ok(vec![McpPrompt::new("summarize")]),
            ..FakeServer::new()
        };
        let report = discover(&server, &config());

        assert!(report.passed());
        assert_eq!(report.result.status, Some(TestConnectionStatus::Successful));
        let names: Vec<&str> = report.result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![STEP_INITIALIZE, STEP_LIST_TOOLS, STEP_LIST_RESOURCES, STEP_LIST_PROMPTS]
        );
        assert_eq!(
            step(&report, STEP_INITIALIZE).message.as_deref(),
            Some("Connected to 'fake' (protocol 2024-11-05)")
        );
        assert_eq!(step(&report, STEP_LIST_TOOLS).message.as_deref(), Some("Found 1 tools"));

        let found = report.discovered.unwrap();
        assert_eq!(found.tools.unwrap()[0].name, "read_file");
        assert_eq!(found.prompts.unwrap()[0].name, "summarize");
    }

    #[test]
    fn launch_failure_fails_and_skips_the_rest() {
        let server = FakeServer {
            refuse: true,
            ..FakeServer::new()
        };
        let report = discover(&server, &config());

        assert!(!report.passed());
        assert!(report.discovered.is_none());
        assert_eq!(report.result.steps.len(), 4);
        assert!(report.failure().unwrap().contains("Failed to spawn MCP server: node"));
        let skipped = step(&report, STEP_LIST_PROMPTS);
        assert!(!skipped.passed && !skipped.mandatory);
        assert!(skipped.message.as_deref().unwrap().starts_with("Skipped"));
    }

    #[test]
    fn optional_list_failure_keeps_the_test_green() {
        let server = FakeServer {
            tools: Ok(vec![McpTool::new("search")]),
            resources: Err("Method not found".to_string()),
            ..FakeServer::new()
        };
        let report = discover(&server, &config());

        assert!(report.passed());
        let resources = step(&report, STEP_LIST_RESOURCES);
        assert!(!resources.passed);
        assert_eq!(resources.error_log.as_deref(), Some("Method not found"));
        assert!(report.discovered.unwrap().resources.is_none());
    }

    #[test]
    fn tool_list_failure_fails_the_test() {
        let server = FakeServer {
            tools: Err("boom".to_string()),
            ..FakeServer::new()
        };
        let report = discover(&server, &config());
        assert!(!report.passed());
        assert_eq!(report.failure(), Some("boom"));
    }

    #[test]
    fn unadvertised_lists_are_skipped_as_empty() {
        let server = FakeServer {
            capabilities: Some(json!({"tools": {}})),
            tools: Ok(vec![McpTool::new("search")]),
            resources: Err("must not be called".to_string()),
            prompts: Err("must not be called".to_string()),
            ..FakeServer::new()
        };
        let report = discover(&server, &config());
        assert!(report.result.steps.iter().all(|s| s.passed));
        let found = report.discovered.unwrap();
        assert_eq!(found.resources, Some(Vec::new()));
        assert_eq!(found.prompts, Some(Vec::new()));
    }

    #[test]
    fn patch_keeps_unread_and_clears_empty_lists() {
        let found = Discovered {
            server: ServerInfo {
                instructions: Some("Prefer read_file for small files".to_string()),
                ..ServerInfo::default()
            },
            tools: Some(vec![McpTool::new("read_file")]),
            resources: None,
            prompts: Some(Vec::new()),
        };
        let patch = found.into_patch();
        assert_eq!(patch.available_tools, FieldPatch::Set(vec![McpTool::new("read_file")]));
        assert_eq!(patch.available_resources, FieldPatch::Keep);
        assert_eq!(patch.available_prompts, FieldPatch::Clear);
        assert_eq!(
            patch.server_instructions,
            FieldPatch::Set("Prefer read_file for small files".to_string())
        );
        assert!(patch.description.is_keep());
    }
}
