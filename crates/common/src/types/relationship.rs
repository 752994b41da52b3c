use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CampaignId, RelationshipId, RelationshipTypeId};
use crate::types::EntityRef;

/// A relationship (edge) between two entities.
///
/// `source`, `target` and `relationship_type_id` form the edge's identity and
/// never change after creation. Only the content fields are mutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: EntityRef,
    pub target: EntityRef,
    pub relationship_type_id: RelationshipTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rating of how strong the bond is, validated against the configured range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<CampaignId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a relationship. The id and timestamps are assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRelationship {
    pub source: EntityRef,
    pub target: EntityRef,
    pub relationship_type_id: RelationshipTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<CampaignId>,
}

fn default_active() -> bool {
    true
}

impl NewRelationship {
    pub fn new(source: EntityRef, target: EntityRef, relationship_type_id: RelationshipTypeId) -> Self {
        Self {
            source,
            target,
            relationship_type_id,
            description: None,
            strength: None,
            is_active: true,
            campaign_id: None,
        }
    }
}

/// Content-only update of an existing relationship.
///
/// All four fields overwrite the stored values. There is deliberately no way
/// to express a change of source, target or type here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipUpdate {
    pub id: RelationshipId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub strength: Option<i32>,
    pub is_active: bool,
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
}

impl RelationshipUpdate {
    /// Start an update from the relationship's current content.
    pub fn from_current(relationship: &Relationship) -> Self {
        Self {
            id: relationship.id,
            description: relationship.description.clone(),
            strength: relationship.strength,
            is_active: relationship.is_active,
            campaign_id: relationship.campaign_id,
        }
    }
}

/// A relationship joined with display metadata.
///
/// The display fields are resolved at read time and are not authoritative;
/// the raw ids inside `relationship` are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDetails {
    #[serde(flatten)]
    pub relationship: Relationship,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type_name: Option<String>,
    #[serde(default)]
    pub is_directional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
}
