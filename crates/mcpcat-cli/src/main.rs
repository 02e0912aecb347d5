//! mcpcat - MCP service catalog
//!
//! Usage:
//!   mcpcat list                          # Registered services
//!   mcpcat create files --command node   # Register a service
//!   mcpcat import claude_desktop.json    # Import a client config
//!   mcpcat discover files                # Read tools from the live server
//!   mcpcat versions files                # Version history

mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use mcpcat_core::catalog::{CatalogService, ListParams};
use mcpcat_core::change::{ChangeSource, MutationContext};
use mcpcat_core::config::{CatalogConfig, ConfigStore};
use mcpcat_core::fqn;
use mcpcat_core::import::parse_client_config;
use mcpcat_core::mcp::{
    McpConnection, McpServerConfig, McpType, StdioConnector, form_schema, form_schemas,
};
use mcpcat_core::permissions::{ServicePermission, visible_view};
use mcpcat_core::service::{CreateMcpService, McpService, McpServicePatch, TestConnectionResult};
use mcpcat_core::store::{EntityStore, JsonFileStore};
use mcpcat_core::tags::{TagSelection, TagSource};
use mcpcat_core::types::{EntityReference, EntityVersion, Include};

use crate::output::{
    OutputFormat, print_history, print_json, print_list, print_put, print_service,
    print_test_result, print_update,
};

#[derive(Parser)]
#[command(name = "mcpcat")]
#[command(about = "MCP service catalog", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/mcpcat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog store file, overriding `store_path` from the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// User recorded as the author of changes
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new MCP service
    Create {
        /// Service name
        name: String,
        /// Command that launches the server
        #[arg(long)]
        command: String,
        /// Argument passed to the command (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Environment variable as KEY=VALUE (repeatable)
        #[arg(long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
        /// Working directory for the server process
        #[arg(long)]
        cwd: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create or update a service from a JSON create request
    Apply {
        /// JSON file holding the request
        file: PathBuf,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one service
    Get {
        /// Service name, FQN or id
        service: String,
        /// Which entities to consider (all, deleted, non-deleted)
        #[arg(long, default_value = "non-deleted", value_parser = parse_include)]
        include: Include,
        /// Show a past version instead of the current one
        #[arg(long)]
        version: Option<EntityVersion>,
        /// Leave out the launch configuration (command, args, env)
        #[arg(long)]
        hide_connection: bool,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List services
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "non-deleted", value_parser = parse_include)]
        include: Include,
        /// Only services in this domain
        #[arg(long)]
        domain: Option<String>,
        /// Page size (default from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Continue after this FQN
        #[arg(long)]
        after: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Apply a JSON merge patch to a service
    Update {
        service: String,
        /// JSON file holding the patch; `null` clears a field
        #[arg(long)]
        patch: PathBuf,
        /// Refuse the patch unless the service is still at this version
        #[arg(long)]
        base_version: Option<EntityVersion>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Replace the service's tags with the given set (the tier is kept)
    Tag {
        service: String,
        /// Classification tag FQNs
        tags: Vec<String>,
        /// Glossary term FQN (repeatable)
        #[arg(long = "glossary")]
        glossary: Vec<String>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Set or clear the tier tag
    Tier {
        service: String,
        /// Tier tag FQN, e.g. Tier.Tier1; omit to clear
        tier: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a service (soft by default)
    #[command(alias = "rm")]
    Delete {
        service: String,
        /// Remove the service and its history for good
        #[arg(long)]
        hard: bool,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Restore a soft-deleted service
    Restore {
        service: String,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the version history of a service
    Versions {
        service: String,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Follow a service
    Follow {
        service: String,
        /// Id of the following user
        #[arg(long)]
        id: Uuid,
        /// Name of the following user (default: current user)
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Stop following a service
    Unfollow {
        service: String,
        #[arg(long)]
        id: Uuid,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Record a connection test result from a JSON file
    TestResult {
        service: String,
        file: PathBuf,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Launch the service's server and record a connection test
    TestConnection {
        service: String,
        /// Seconds to wait for each answer
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Read tools, resources and prompts from the live server into the catalog
    Discover {
        service: String,
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the connection form schema
    FormSchema {
        /// Connection type (default: all)
        #[arg(value_parser = parse_mcp_type)]
        kind: Option<McpType>,
    },

    /// Import servers from a client config ({"mcpServers": ...})
    Import {
        file: PathBuf,
        /// Show what would be imported without writing
        #[arg(long)]
        dry_run: bool,
        /// Launch each imported server and read its capabilities
        #[arg(long, conflicts_with = "dry_run")]
        discover: bool,
        /// Seconds to wait for each answer during discovery
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcpcat=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli)
}

/// Resolved settings for one invocation.
struct Session {
    catalog: CatalogService<JsonFileStore>,
    user: String,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = load_config(cli.config.as_ref())?;
        let store_path = match &cli.store {
            Some(path) => path.clone(),
            None => config.store_path()?,
        };
        let store = JsonFileStore::open(&store_path)
            .with_context(|| format!("Failed to open catalog at {}", store_path.display()))?;
        tracing::debug!(store = %store_path.display(), "Opened catalog");

        Ok(Self {
            catalog: CatalogService::new(store, config.settings()),
            user: cli.user.clone().unwrap_or_else(|| config.user()),
        })
    }

    fn ctx(&self) -> MutationContext {
        MutationContext::manual(&self.user)
    }

    /// Look a service up by id, FQN or bare name, deleted ones included.
    fn resolve(&self, service: &str) -> Result<McpService> {
        if let Ok(id) = Uuid::parse_str(service) {
            return Ok(self.catalog.get(id, Include::All)?);
        }
        let store = self.catalog.store();
        let found = match store.get_by_fqn(service)? {
            Some(entity) => Some(entity),
            None => store.get_by_fqn(&fqn::quote_name(service))?,
        };
        found.with_context(|| format!("MCP service '{service}' not found"))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CatalogConfig> {
    let store = match path {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default()?,
    };
    store.load()
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::FormSchema { kind } = &cli.command {
        return match kind {
            Some(kind) => print_json(&form_schema(*kind)),
            None => print_json(&form_schemas()),
        };
    }

    let mut session = Session::open(&cli)?;
    match cli.command {
        Commands::Create {
            name,
            command,
            args,
            env,
            cwd,
            description,
            display_name,
            format,
        } => {
            let mut server = McpServerConfig::new(command);
            if !args.is_empty() {
                server = server.with_args(args);
            }
            for (key, value) in env {
                server = server.with_env(key, value);
            }
            if let Some(cwd) = cwd {
                server = server.with_cwd(cwd);
            }

            let mut request = CreateMcpService::new(name, McpConnection::new(server));
            request.description = description;
            if let Some(display_name) = display_name {
                request = request.with_display_name(display_name);
            }

            let ctx = session.ctx();
            let entity = session.catalog.create(request, &ctx)?;
            match format {
                OutputFormat::Table => println!(
                    "{} Created '{}' (version {})",
                    style("✓").green(),
                    entity.fully_qualified_name,
                    entity.version
                ),
                OutputFormat::Json => print_json(&entity)?,
            }
        }
        Commands::Apply { file, format } => {
            let request: CreateMcpService = read_json(&file)?;
            let ctx = session.ctx();
            let outcome = session.catalog.create_or_update(request, &ctx)?;
            print_put(&outcome, format)?;
        }
        Commands::Get {
            service,
            include,
            version,
            hide_connection,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let entity = match version {
                Some(version) => session.catalog.get_version(entity.id, version)?,
                None => session.catalog.get(entity.id, include)?,
            };
            let permission = ServicePermission {
                view_connection: !hide_connection,
                ..ServicePermission::all()
            };
            print_service(&visible_view(&entity, &permission), format)?;
        }
        Commands::List {
            include,
            domain,
            limit,
            after,
            format,
        } => {
            let params = ListParams {
                include,
                domain,
                limit,
                after,
            };
            print_list(&session.catalog.list(&params)?, format)?;
        }
        Commands::Update {
            service,
            patch,
            base_version,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let patch: McpServicePatch = read_json(&patch)?;
            let ctx = session.ctx();
            let update = session
                .catalog
                .update(entity.id, patch, base_version, &ctx)?;
            print_update("Updated", &update, format)?;
        }
        Commands::Tag {
            service,
            tags,
            glossary,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let selected: Vec<TagSelection> = tags
                .into_iter()
                .map(|t| TagSelection::new(t, TagSource::Classification))
                .chain(
                    glossary
                        .into_iter()
                        .map(|t| TagSelection::new(t, TagSource::Glossary)),
                )
                .collect();
            let ctx = session.ctx();
            let update = session.catalog.update_tags(entity.id, &selected, &ctx)?;
            print_update("Tagged", &update, format)?;
        }
        Commands::Tier {
            service,
            tier,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let tier = tier.map(|t| TagSelection::new(t, TagSource::Classification));
            let ctx = session.ctx();
            let update = session.catalog.set_tier(entity.id, tier, &ctx)?;
            print_update("Updated tier of", &update, format)?;
        }
        Commands::Delete {
            service,
            hard,
            yes,
            format,
        } => {
            let entity = session.resolve(&service)?;
            if hard {
                let versions = session.catalog.list_versions(entity.id)?.versions.len();
                if !yes && !confirm_hard_delete(&entity, versions)? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
                let removed = session.catalog.hard_delete(entity.id)?;
                match format {
                    OutputFormat::Table => println!(
                        "{} Permanently deleted '{}'",
                        style("✓").green(),
                        removed.fully_qualified_name
                    ),
                    OutputFormat::Json => print_json(&removed)?,
                }
            } else {
                let ctx = session.ctx();
                let update = session.catalog.soft_delete(entity.id, &ctx)?;
                print_update("Deleted", &update, format)?;
            }
        }
        Commands::Restore { service, format } => {
            let entity = session.resolve(&service)?;
            let ctx = session.ctx();
            let update = session.catalog.restore(entity.id, &ctx)?;
            print_update("Restored", &update, format)?;
        }
        Commands::Versions { service, format } => {
            let entity = session.resolve(&service)?;
            print_history(&session.catalog.list_versions(entity.id)?, format)?;
        }
        Commands::Follow {
            service,
            id,
            name,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let follower = EntityReference::user(id, name.unwrap_or_else(|| session.user.clone()));
            let ctx = session.ctx();
            let update = session.catalog.add_follower(entity.id, follower, &ctx)?;
            print_update("Followed", &update, format)?;
        }
        Commands::Unfollow {
            service,
            id,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let ctx = session.ctx();
            let update = session.catalog.remove_follower(entity.id, id, &ctx)?;
            print_update("Unfollowed", &update, format)?;
        }
        Commands::TestResult {
            service,
            file,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let result: TestConnectionResult = read_json(&file)?;
            let ctx = session.ctx();
            let update = session
                .catalog
                .add_test_connection_result(entity.id, result, &ctx)?;
            print_update("Recorded connection test for", &update, format)?;
        }
        Commands::TestConnection {
            service,
            timeout,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let ctx = session.ctx().with_source(ChangeSource::Automated);
            let update =
                session
                    .catalog
                    .test_connection(entity.id, &connector(timeout), &ctx)?;
            print_test_result(&update, format)?;
        }
        Commands::Discover {
            service,
            timeout,
            format,
        } => {
            let entity = session.resolve(&service)?;
            let ctx = session.ctx().with_source(ChangeSource::Ingested);
            let update =
                session
                    .catalog
                    .discover_capabilities(entity.id, &connector(timeout), &ctx)?;
            print_update("Discovered capabilities of", &update, format)?;
        }
        Commands::Import {
            file,
            dry_run,
            discover,
            timeout,
            format,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let requests = parse_client_config(&content)
                .with_context(|| format!("Failed to parse client config {}", file.display()))?;

            if dry_run {
                return print_import_plan(&requests, format);
            }

            let ctx = session.ctx().with_source(ChangeSource::Ingested);
            let mut outcomes = BTreeMap::new();
            for request in requests {
                let name = request.name.clone();
                let outcome = session.catalog.create_or_update(request, &ctx)?;
                if format == OutputFormat::Table {
                    print_put(&outcome, format)?;
                }
                let mut status = outcome.status();
                if discover {
                    let id = outcome.entity().id;
                    match session
                        .catalog
                        .discover_capabilities(id, &connector(timeout), &ctx)
                    {
                        Ok(update) => {
                            if format == OutputFormat::Table {
                                print_update("Discovered capabilities of", &update, format)?;
                            }
                            if !update.is_noop() {
                                status = "discovered";
                            }
                        }
                        Err(e) if e.is_connection() => {
                            tracing::warn!(server = %name, error = %e, "Capability discovery failed");
                            status = "unreachable";
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                outcomes.insert(name, status);
            }
            if format == OutputFormat::Json {
                print_json(&outcomes)?;
            }
        }
        Commands::FormSchema { .. } => {}
    }
    Ok(())
}

fn connector(timeout_secs: u64) -> StdioConnector {
    StdioConnector {
        timeout: Duration::from_secs(timeout_secs),
    }
}

fn confirm_hard_delete(entity: &McpService, versions: usize) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Permanently delete '{}' and all {} of its versions?",
            entity.fully_qualified_name, versions
        ))
        .default(false)
        .interact()
        .context("Failed to read confirmation; pass -y to skip it")?;
    Ok(confirmed)
}

fn print_import_plan(requests: &[CreateMcpService], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&requests),
        OutputFormat::Table => {
            if requests.is_empty() {
                println!("No importable servers found.");
            }
            for request in requests {
                let command = request
                    .connection
                    .as_ref()
                    .and_then(|c| c.server_config())
                    .map(|s| s.command_line())
                    .unwrap_or_default();
                println!("  {:<24} {}", request.name, command);
            }
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn parse_include(s: &str) -> Result<Include, String> {
    Include::try_from(s).map_err(|e| e.to_string())
}

fn parse_mcp_type(s: &str) -> Result<McpType, String> {
    McpType::try_from(s).map_err(|e| e.to_string())
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("CLI parsing should succeed")
    }

    #[test]
    fn create_collects_args_and_env() {
        let cli = parse(&[
            "mcpcat",
            "create",
            "filesystem",
            "--command",
            "node",
            "--arg",
            "mcp-server.js",
            "--arg",
            "--readonly",
            "--env",
            "NODE_ENV=development",
        ]);
        let Commands::Create { args, env, .. } = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args, vec!["mcp-server.js", "--readonly"]);
        assert_eq!(env, vec![("NODE_ENV".to_string(), "development".to_string())]);
    }

    #[test]
    fn env_pair_requires_equals() {
        assert!(parse_env_pair("NODE_ENV").is_err());
        assert!(parse_env_pair("=x").is_err());
        assert_eq!(
            parse_env_pair("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
    }

    #[test]
    fn list_parses_include_and_paging() {
        let cli = parse(&[
            "mcpcat", "list", "--include", "all", "--limit", "5", "--after", "alpha", "-f", "json",
        ]);
        let Commands::List {
            include,
            limit,
            after,
            format,
            ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(include, Include::All);
        assert_eq!(limit, Some(5));
        assert_eq!(after.as_deref(), Some("alpha"));
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn invalid_include_is_rejected() {
        assert!(Cli::try_parse_from(["mcpcat", "list", "--include", "some"]).is_err());
    }

    #[test]
    fn update_parses_base_version() {
        let cli = parse(&[
            "mcpcat",
            "update",
            "filesystem",
            "--patch",
            "patch.json",
            "--base-version",
            "1.2",
        ]);
        let Commands::Update { base_version, .. } = cli.command else {
            panic!("expected update");
        };
        assert_eq!(base_version, Some(EntityVersion::from_tenths(12)));
    }

    #[test]
    fn delete_flags_and_global_options() {
        let cli = parse(&[
            "mcpcat",
            "rm",
            "filesystem",
            "--hard",
            "-y",
            "--store",
            "/tmp/catalog.json",
            "--user",
            "ops",
        ]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/catalog.json")));
        assert_eq!(cli.user.as_deref(), Some("ops"));
        let Commands::Delete { hard, yes, .. } = cli.command else {
            panic!("expected delete");
        };
        assert!(hard && yes);
    }

    #[test]
    fn tier_is_optional() {
        let cli = parse(&["mcpcat", "tier", "filesystem"]);
        assert!(matches!(cli.command, Commands::Tier { tier: None, .. }));
    }

    #[test]
    fn form_schema_kind_is_checked() {
        let cli = parse(&["mcpcat", "form-schema", "Mcp"]);
        assert!(matches!(
            cli.command,
            Commands::FormSchema {
                kind: Some(McpType::Mcp)
            }
        ));
        assert!(Cli::try_parse_from(["mcpcat", "form-schema", "Kafka"]).is_err());
    }

    #[test]
    fn get_can_hide_connection() {
        let cli = parse(&["mcpcat", "get", "filesystem", "--hide-connection"]);
        assert!(matches!(
            cli.command,
            Commands::Get {
                hide_connection: true,
                ..
            }
        ));
    }

    #[test]
    fn discovery_commands_take_a_timeout() {
        let cli = parse(&["mcpcat", "discover", "filesystem", "--timeout", "5"]);
        assert!(matches!(cli.command, Commands::Discover { timeout: 5, .. }));

        let cli = parse(&["mcpcat", "test-connection", "filesystem"]);
        assert!(matches!(
            cli.command,
            Commands::TestConnection { timeout: 30, .. }
        ));
        assert_eq!(connector(5).timeout, Duration::from_secs(5));
    }

    #[test]
    fn import_discover_excludes_dry_run() {
        let cli = parse(&["mcpcat", "import", "claude.json", "--discover"]);
        assert!(matches!(cli.command, Commands::Import { discover: true, .. }));
        assert!(
            Cli::try_parse_from(["mcpcat", "import", "claude.json", "--discover", "--dry-run"])
                .is_err()
        );
    }

    #[test]
    fn follow_requires_uuid() {
        assert!(Cli::try_parse_from(["mcpcat", "follow", "files", "--id", "nope"]).is_err());
        let id = Uuid::new_v4().to_string();
        assert!(Cli::try_parse_from(["mcpcat", "follow", "files", "--id", id.as_str()]).is_ok());
    }
}
