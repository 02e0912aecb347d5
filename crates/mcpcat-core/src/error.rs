//! Catalog error types.

use thiserror::Error;

/// Convenience alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalog operations.
///
/// Every variant is terminal for the operation that produced it; callers
/// decide whether to re-fetch and retry.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request violates an entity invariant. Nothing was applied.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The write was based on a stale version, or collides with an existing name.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The service's server could not be launched or did not answer.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
