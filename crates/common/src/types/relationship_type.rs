use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RelationshipTypeId;

/// A kind of relationship in the type catalog (Friend, Ally, Mentor, ...).
///
/// Directional types may name an inverse type (Mentor ↔ Student). Only the
/// forward edge is ever stored; the inverse label is resolved when read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub id: RelationshipTypeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_directional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_type_id: Option<RelationshipTypeId>,
    /// Name of the inverse type. Resolved from the catalog, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_type_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RelationshipType {
    /// Whether `name` refers to this type (case-insensitive).
    pub fn matches_name(&self, name: &str) -> bool {
        type_name_key(&self.name) == type_name_key(name)
    }
}

/// Normalized lookup key for a type name. Mirrors the `LOWER(name)` unique
/// index: case-insensitive, otherwise exact. Whitespace is significant.
pub fn type_name_key(name: &str) -> String {
    name.to_lowercase()
}
