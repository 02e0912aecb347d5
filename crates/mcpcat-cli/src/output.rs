//! Table and JSON rendering for CLI results.

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use serde::Serialize;

use mcpcat_core::catalog::{EntityHistory, PutOutcome, ResultList};
use mcpcat_core::change::ChangeDescription;
use mcpcat_core::mcp::rows::{prompt_rows, resource_rows, tool_rows};
use mcpcat_core::service::{McpService, TestConnectionStatus, TestConnectionStep, Update};

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_service(service: &McpService, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_service_detail(service),
        OutputFormat::Json => print_json(service)?,
    }
    Ok(())
}

pub fn print_update(verb: &str, update: &Update, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let service = &update.entity;
            match &update.change {
                Some(change) => {
                    println!(
                        "{} {} '{}' (version {})",
                        style("✓").green(),
                        verb,
                        service.fully_qualified_name,
                        service.version
                    );
                    print_change(change);
                }
                None => println!(
                    "• '{}' unchanged at version {}",
                    service.fully_qualified_name, service.version
                ),
            }
        }
        OutputFormat::Json => print_json(&update.entity)?,
    }
    Ok(())
}

pub fn print_put(outcome: &PutOutcome, format: OutputFormat) -> Result<()> {
    match (outcome, format) {
        (PutOutcome::Updated(update), OutputFormat::Table) => print_update("Updated", update, format),
        (_, OutputFormat::Table) => {
            let service = outcome.entity();
            println!(
                "{} {} '{}' (version {})",
                style("✓").green(),
                outcome.status(),
                service.fully_qualified_name,
                service.version
            );
            Ok(())
        }
        (_, OutputFormat::Json) => print_json(&serde_json::json!({
            "status": outcome.status(),
            "entity": outcome.entity(),
        })),
    }
}

pub fn print_test_result(update: &Update, format: OutputFormat) -> Result<()> {
    let service = &update.entity;
    let Some(result) = &service.test_connection_result else {
        return print_update("Tested", update, format);
    };
    if format == OutputFormat::Json {
        return print_json(result);
    }

    let status = match result.effective_status() {
        TestConnectionStatus::Successful => style("passed").green(),
        TestConnectionStatus::Failed => style("failed").red(),
        TestConnectionStatus::Running => style("running").yellow(),
    };
    println!(
        "Connection test for '{}' {} (version {})",
        service.fully_qualified_name, status, service.version
    );
    for step in &result.steps {
        println!("  {}", step_line(step));
    }
    Ok(())
}

fn step_line(step: &TestConnectionStep) -> String {
    let mark = if step.passed { "✓" } else { "✗" };
    let detail = step
        .error_log
        .as_deref()
        .or(step.message.as_deref())
        .unwrap_or_default();
    let optional = if step.mandatory { "" } else { " (optional)" };
    format!("{mark} {:<14} {}{optional}", step.name, truncate(detail, 60))
}

pub fn print_list(list: &ResultList<McpService>, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(list);
    }

    if list.data.is_empty() {
        println!("No MCP services registered.");
        println!("Add one with: mcpcat create <name> --command <cmd>");
        return Ok(());
    }

    println!(
        "{:<24} {:<8} {:<6} {:<20} {:<12} Status",
        "Name", "Version", "Tools", "Updated", "Updated By"
    );
    println!("{}", "-".repeat(80));
    for service in &list.data {
        let status = if service.is_deleted() {
            style("deleted").red().to_string()
        } else {
            style("active").green().to_string()
        };
        println!(
            "{:<24} {:<8} {:<6} {:<20} {:<12} {}",
            truncate(&service.fully_qualified_name, 24),
            service.version.to_string(),
            service.tools().len(),
            format_timestamp(service.updated_at),
            truncate(&service.updated_by, 12),
            status
        );
    }
    println!();
    match &list.paging.after {
        Some(after) => println!(
            "Showing {} of {} (next page: --after '{}')",
            list.data.len(),
            list.paging.total,
            after
        ),
        None => println!("Showing {} of {}", list.data.len(), list.paging.total),
    }
    Ok(())
}

pub fn print_history(history: &EntityHistory, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(history);
    }

    println!("{:<8} {:<20} {:<12} Changed", "Version", "Updated", "Updated By");
    println!("{}", "-".repeat(70));
    for version in &history.versions {
        let fields = version
            .change_description
            .as_ref()
            .map(|c| c.changed_fields().join(", "))
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "(created)".to_string());
        println!(
            "{:<8} {:<20} {:<12} {}",
            version.version.to_string(),
            format_timestamp(version.updated_at),
            truncate(&version.updated_by, 12),
            fields
        );
    }
    Ok(())
}

fn print_service_detail(service: &McpService) {
    println!("{}", style(service.label()).bold().cyan());
    println!("  FQN:        {}", service.fully_qualified_name);
    println!("  Id:         {}", service.id);
    println!("  Type:       {}", service.service_type);
    println!("  Version:    {}", service.version);
    println!(
        "  Updated:    {} by {}",
        format_timestamp(service.updated_at),
        service.updated_by
    );
    if service.is_deleted() {
        println!("  Status:     {}", style("deleted").red());
    }
    if let Some(description) = &service.description {
        println!("  About:      {description}");
    }
    if let Some(server) = service.connection.as_ref().and_then(|c| c.server_config()) {
        println!("  Command:    {}", server.command_line());
        if let Some(cwd) = &server.cwd {
            println!("  Directory:  {cwd}");
        }
        for key in server.env.iter().flat_map(|env| env.keys()) {
            println!("  Env:        {key}");
        }
    }
    if !service.tags().is_empty() {
        let tags: Vec<&str> = service.tags().iter().map(|t| t.tag_fqn.as_str()).collect();
        println!("  Tags:       {}", tags.join(", "));
    }
    if !service.followers().is_empty() {
        println!("  Followers:  {}", service.followers().len());
    }
    if let Some(result) = &service.test_connection_result {
        println!("  Connection: {:?}", result.effective_status());
    }

    let tools = tool_rows(service.tools());
    if !tools.is_empty() {
        println!();
        println!("Tools ({}):", tools.len());
        println!("  {:<24} {:<14} Description", "Name", "Category");
        println!("  {}", "-".repeat(70));
        for row in tools {
            println!(
                "  {:<24} {:<14} {}",
                truncate(&row.name, 24),
                truncate(&row.category, 14),
                truncate(&row.description, 40)
            );
        }
    }

    let resources = resource_rows(service.resources());
    if !resources.is_empty() {
        println!();
        println!("Resources ({}):", resources.len());
        println!("  {:<20} {:<30} MIME Type", "Name", "URI");
        println!("  {}", "-".repeat(70));
        for row in resources {
            println!(
                "  {:<20} {:<30} {}",
                truncate(&row.name, 20),
                truncate(&row.uri, 30),
                row.mime_type
            );
        }
    }

    let prompts = prompt_rows(service.prompts());
    if !prompts.is_empty() {
        println!();
        println!("Prompts ({}):", prompts.len());
        println!("  {:<20} Arguments", "Name");
        println!("  {}", "-".repeat(70));
        for row in prompts {
            println!("  {:<20} {}", truncate(&row.name, 20), row.arguments);
        }
    }
}

fn print_change(change: &ChangeDescription) {
    for field in change.added() {
        println!("  {} {}", style("+").green(), field.name);
    }
    for field in change.updated() {
        println!("  {} {}", style("~").yellow(), field.name);
    }
    for field in change.deleted() {
        println!("  {} {}", style("-").red(), field.name);
    }
}

/// Epoch milliseconds as a UTC timestamp.
pub fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn step_line_prefers_error_log() {
        let step = TestConnectionStep {
            name: "ListResources".to_string(),
            mandatory: false,
            passed: false,
            message: Some("ignored".to_string()),
            error_log: Some("'resources/list' failed: Method not found".to_string()),
        };
        assert_eq!(
            step_line(&step),
            "✗ ListResources  'resources/list' failed: Method not found (optional)"
        );

        let step = TestConnectionStep {
            name: "Initialize".to_string(),
            mandatory: true,
            passed: true,
            message: Some("Connected".to_string()),
            error_log: None,
        };
        assert_eq!(step_line(&step), "✓ Initialize     Connected");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("filesystem-server", 10), "filesys...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }
}
