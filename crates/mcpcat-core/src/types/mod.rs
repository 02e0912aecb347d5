//! Shared core types used across the entity, change and store layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Typed pointer to another catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: Uuid,
    /// Entity type, e.g. `user`, `team`, `domain`, `dataProduct`.
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Set when the reference was inherited from a parent entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl EntityReference {
    pub fn new(id: Uuid, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            name: None,
            fully_qualified_name: None,
            display_name: None,
            description: None,
            deleted: None,
            inherited: None,
            href: None,
        }
    }

    /// Reference to a user, named so that listings stay readable.
    pub fn user(id: Uuid, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            fully_qualified_name: Some(name.clone()),
            name: Some(name),
            ..Self::new(id, "user")
        }
    }
}

/// Entity version number.
///
/// Versions carry exactly one fractional digit (`0.1`, `0.2`, `1.2`). They are
/// kept as tenths so that repeated minor increments never drift, and are
/// serialized as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityVersion(u32);

impl EntityVersion {
    /// Version assigned on creation.
    pub const INITIAL: EntityVersion = EntityVersion(1);

    pub fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    pub fn tenths(self) -> u32 {
        self.0
    }

    /// Next minor version (`+0.1`), or `None` once the counter is exhausted.
    pub fn next_minor(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Next major version (`+1.0`), or `None` once the counter is exhausted.
    pub fn next_major(self) -> Option<Self> {
        self.0.checked_add(10).map(Self)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Accepts only non-negative whole numbers of tenths.
    fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) / 10.0 {
            return None;
        }
        let scaled = value * 10.0;
        let tenths = scaled.round();
        if (scaled - tenths).abs() > 1e-6 {
            return None;
        }
        Some(Self(tenths as u32))
    }
}

impl Default for EntityVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl FromStr for EntityVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid version: '{}'", s))?;
        Self::from_f64(value).ok_or_else(|| format!("Invalid version: '{}'", s))
    }
}

impl Serialize for EntityVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for EntityVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid entity version: {value}")))
    }
}

/// Which entities a read includes, based on the soft-delete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Include {
    All,
    Deleted,
    #[default]
    NonDeleted,
}

impl Include {
    pub fn admits(self, deleted: bool) -> bool {
        match self {
            Include::All => true,
            Include::Deleted => deleted,
            Include::NonDeleted => !deleted,
        }
    }
}

impl TryFrom<&str> for Include {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "all" => Ok(Include::All),
            "deleted" => Ok(Include::Deleted),
            "non-deleted" => Ok(Include::NonDeleted),
            _ => anyhow::bail!(
                "include must be one of [all, deleted, non-deleted], got '{}'",
                value
            ),
        }
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
