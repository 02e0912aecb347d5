//! Edit capabilities derived from a caller's permissions on a service.
//!
//! Permission evaluation itself happens elsewhere; this module only turns the
//! resulting flags into what a presentation layer may offer.

use serde::{Deserialize, Serialize};

use crate::service::McpService;

/// Permission flags a caller holds on one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePermission {
    #[serde(default)]
    pub edit_all: bool,
    #[serde(default)]
    pub edit_tags: bool,
    #[serde(default)]
    pub edit_glossary_terms: bool,
    #[serde(default)]
    pub edit_description: bool,
    #[serde(default)]
    pub view_connection: bool,
}

impl ServicePermission {
    pub fn all() -> Self {
        Self {
            edit_all: true,
            edit_tags: true,
            edit_glossary_terms: true,
            edit_description: true,
            view_connection: true,
        }
    }
}

/// What may be edited on a service right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCapabilities {
    pub edit_tags: bool,
    pub edit_glossary_terms: bool,
    pub edit_description: bool,
    pub edit_data_products: bool,
}

impl EditCapabilities {
    /// Deleted services are read-only whatever the permissions.
    pub fn resolve(permission: &ServicePermission, deleted: bool) -> Self {
        let live = !deleted;
        Self {
            edit_tags: (permission.edit_tags || permission.edit_all) && live,
            edit_glossary_terms: (permission.edit_glossary_terms || permission.edit_all) && live,
            edit_description: (permission.edit_description || permission.edit_all) && live,
            edit_data_products: permission.edit_all && live,
        }
    }
}

/// The view of `service` a caller with `permission` may see.
pub fn visible_view(service: &McpService, permission: &ServicePermission) -> McpService {
    if permission.view_connection {
        service.clone()
    } else {
        service.redacted()
    }
}
