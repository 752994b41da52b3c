use lorekeeper_common::ids::{CampaignId, RelationshipTypeId};
use lorekeeper_common::types::{EntityRef, Relationship};

/// The read shapes supported over the edge store.
///
/// Every shape returns newest first (`created_at` desc, then `id` desc) and
/// excludes inactive edges unless the caller asks for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationshipQuery {
    /// Edges where the entity is either source or target.
    ForEntity(EntityRef),
    /// Edges where the entity is the source.
    FromEntity(EntityRef),
    /// Edges where the entity is the target.
    ToEntity(EntityRef),
    /// `ForEntity` narrowed to one relationship type.
    ByType {
        entity: EntityRef,
        relationship_type_id: RelationshipTypeId,
    },
    /// Edges scoped to a campaign, whatever their endpoints.
    ByCampaign(CampaignId),
}

impl RelationshipQuery {
    /// Whether a relationship belongs to this shape, ignoring the active flag.
    pub fn matches(&self, relationship: &Relationship) -> bool {
        match self {
            Self::ForEntity(entity) => touches(relationship, entity),
            Self::FromEntity(entity) => relationship.source == *entity,
            Self::ToEntity(entity) => relationship.target == *entity,
            Self::ByType {
                entity,
                relationship_type_id,
            } => {
                relationship.relationship_type_id == *relationship_type_id
                    && touches(relationship, entity)
            }
            Self::ByCampaign(campaign_id) => relationship.campaign_id == Some(*campaign_id),
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ForEntity(_) => "for_entity",
            Self::FromEntity(_) => "from_entity",
            Self::ToEntity(_) => "to_entity",
            Self::ByType { .. } => "by_type",
            Self::ByCampaign(_) => "by_campaign",
        }
    }
}

fn touches(relationship: &Relationship, entity: &EntityRef) -> bool {
    relationship.source == *entity || relationship.target == *entity
}
