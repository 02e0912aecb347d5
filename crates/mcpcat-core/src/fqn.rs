//! Fully qualified names.
//!
//! A service is a top-level entity, so its FQN is its name. A name that
//! contains `.` is wrapped in double quotes so the FQN stays unambiguous.

use crate::error::{CatalogError, CatalogResult};

pub const MAX_NAME_LEN: usize = 256;

/// Check that a name can be used as an entity name.
pub fn validate_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains("::") {
        return Err(CatalogError::validation(format!(
            "name '{name}' must not contain '::'"
        )));
    }
    if name.contains('"') {
        return Err(CatalogError::validation(format!(
            "name '{name}' must not contain '\"'"
        )));
    }
    Ok(())
}

/// Quote a single name for use inside an FQN.
pub fn quote_name(name: &str) -> String {
    if name.contains('.') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_names_with_dots() {
        assert_eq!(quote_name("filesystem"), "filesystem");
        assert_eq!(quote_name("mcp.v2"), "\"mcp.v2\"");
    }

    #[test]
    fn rejects_bad_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("a::b").is_err());
        assert!(validate_name("say\"hi").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("my-mcp.server").is_ok());
    }
}
