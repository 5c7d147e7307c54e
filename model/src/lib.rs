//! Shared directory model for the `server` and `client` crates.
//!
//! This crate owns the JSON shapes exchanged over the REST boundary and the
//! role vocabulary used by permission gates on both sides.


use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`Role`] from its wire name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque collection identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub i64);

/// Opaque source identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub i64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CollectionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A media source listed in the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    /// Canonical name, usually the domain.
    pub name: String,
    /// Human-friendly label, if curated.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Platform the source publishes on (e.g. `"online_news"`).
    #[serde(default)]
    pub platform: Option<String>,
}

impl Source {
    /// Label when curated, otherwise the canonical name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().filter(|l| !l.trim().is_empty()).unwrap_or(&self.name)
    }
}

/// A named grouping of sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Sources associated with one collection, as returned by the association query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationList {
    pub sources: Vec<Source>,
}

impl AssociationList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Address of one collection/source association. There is no separate
/// association id; removal is keyed by this pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    pub source_id: SourceId,
    pub collection_id: CollectionId,
}

// =============================================================================
// ROLES
// =============================================================================

/// Permission tiers, ordered from least to most privileged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Anonymous,
    User,
    Contributor,
    Staff,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::User => "user",
            Self::Contributor => "contributor",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its lowercase wire name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRole`] for names outside the role vocabulary.
    pub fn parse(raw: &str) -> Result<Self, UnknownRole> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "user" => Ok(Self::User),
            "contributor" => Ok(Self::Contributor),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRole(raw.to_owned())),
        }
    }
}

/// Whether `role` meets the `required` tier.
#[must_use]
pub fn has_capability(role: Role, required: Role) -> bool {
    role >= required
}

/// The signed-in user as reported by `/api/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}
