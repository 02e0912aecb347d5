//! Listing, paging and version history envelopes.

use serde::{Deserialize, Serialize};

use crate::service::McpService;
use crate::types::Include;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub include: Include,
    /// Only services assigned to this domain (by FQN or name).
    pub domain: Option<String>,
    /// Page size; the catalog default applies when `None`.
    pub limit: Option<usize>,
    /// Return entities whose FQN sorts after this cursor.
    pub after: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Number of matching entities across all pages.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultList<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

/// Every stored version of one entity, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHistory {
    pub entity_type: String,
    pub versions: Vec<McpService>,
}

pub(crate) fn in_domain(service: &McpService, domain: &str) -> bool {
    service.domains.iter().flatten().any(|d| {
        d.fully_qualified_name.as_deref() == Some(domain) || d.name.as_deref() == Some(domain)
    })
}

/// Filter, sort and cut one page out of `services`.
pub(crate) fn paginate(
    mut services: Vec<McpService>,
    params: &ListParams,
    limit: usize,
) -> ResultList<McpService> {
    services.retain(|s| params.include.admits(s.is_deleted()));
    if let Some(domain) = &params.domain {
        services.retain(|s| in_domain(s, domain));
    }
    services.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));

    let total = services.len();
    let remaining: Vec<McpService> = match &params.after {
        Some(cursor) => services
            .into_iter()
            .filter(|s| s.fully_qualified_name.as_str() > cursor.as_str())
            .collect(),
        None => services,
    };

    let has_more = remaining.len() > limit;
    let data: Vec<McpService> = remaining.into_iter().take(limit).collect();
    let after = if has_more {
        data.last().map(|s| s.fully_qualified_name.clone())
    } else {
        None
    };

    ResultList {
        data,
        paging: Paging { after, total },
    }
}
