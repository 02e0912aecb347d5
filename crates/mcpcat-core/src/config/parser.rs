//! TOML parser with line-context error messages

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::CatalogConfig;

pub fn parse_config(path: &Path) -> Result<CatalogConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config_str(content: &str) -> Result<CatalogConfig> {
    let config: CatalogConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    config.validate()?;
    Ok(config)
}

pub fn to_toml(config: &CatalogConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")
}

fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {}", message);
    };

    let line_num = content[..span.start.min(content.len())]
        .matches('\n')
        .count()
        + 1;
    anyhow::anyhow!(
        "TOML parsing error at line {}:\n{}\n\nError: {}",
        line_num,
        line_context(content, line_num),
        message
    )
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::DuplicatePolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.duplicate_capabilities, DuplicatePolicy::Warn);
    }

    #[test]
    fn full_config() {
        let config = parse_config_str(
            r#"
store_path = "/var/lib/mcpcat/catalog.json"
user = "ops"
duplicate_capabilities = "reject"
page_size = 50
"#,
        )
        .unwrap();
        assert_eq!(config.user(), "ops");
        assert_eq!(
            config.store_path().unwrap(),
            std::path::PathBuf::from("/var/lib/mcpcat/catalog.json")
        );
        assert_eq!(config.settings().duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.settings().page_size, 50);
    }

    #[test]
    fn out_of_range_page_size_is_rejected() {
        let err = parse_config_str("page_size = 0").unwrap_err();
        assert!(err.to_string().contains("page_size"));
        assert!(parse_config_str("page_size = 1001").is_err());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(parse_config_str(r#"duplicate_capabilities = "ignore""#).is_err());
    }

    #[test]
    fn error_points_at_line() {
        let err = parse_config_str("user = \"ops\"\npage_size = \"ten\"\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains(">>>"), "{message}");
    }

    #[test]
    fn parse_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "user = \"dev\"").unwrap();
        let config = parse_config(file.path()).unwrap();
        assert_eq!(config.user.as_deref(), Some("dev"));
    }

    #[test]
    fn toml_round_trip() {
        let config = CatalogConfig {
            user: Some("ops".into()),
            page_size: 25,
            ..CatalogConfig::default()
        };
        let text = to_toml(&config).unwrap();
        assert_eq!(parse_config_str(&text).unwrap(), config);
    }
}
