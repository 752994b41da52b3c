use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LorekeeperError;
use crate::ids::{NpcId, OrganizationId, PcId};

/// The closed set of entity kinds that can take part in a relationship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Npc,
    Pc,
    Organization,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Npc, Self::Pc, Self::Organization];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Npc => "npc",
            Self::Pc => "pc",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for EntityKind {
    type Err = LorekeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npc" => Ok(Self::Npc),
            "pc" => Ok(Self::Pc),
            "organization" => Ok(Self::Organization),
            other => Err(LorekeeperError::Validation(format!(
                "unknown entity kind '{}' (expected npc, pc or organization)",
                other
            ))),
        }
    }
}

/// A polymorphic reference to one endpoint of a relationship.
///
/// Serialized as `{"kind": "npc", "id": 10}`. Storage keeps the same
/// (kind text, numeric id) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Npc(NpcId),
    Pc(PcId),
    Organization(OrganizationId),
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        match kind {
            EntityKind::Npc => Self::Npc(NpcId(id)),
            EntityKind::Pc => Self::Pc(PcId(id)),
            EntityKind::Organization => Self::Organization(OrganizationId(id)),
        }
    }

    /// Build a reference from its untyped wire/storage parts.
    /// Unknown kind tags are rejected with a validation error.
    pub fn from_parts(kind: &str, id: i64) -> Result<Self, LorekeeperError> {
        Ok(Self::new(kind.parse()?, id))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Npc(_) => EntityKind::Npc,
            Self::Pc(_) => EntityKind::Pc,
            Self::Organization(_) => EntityKind::Organization,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Npc(id) => id.0,
            Self::Pc(id) => id.0,
            Self::Organization(id) => id.0,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.id())
    }
}

impl From<NpcId> for EntityRef {
    fn from(id: NpcId) -> Self {
        Self::Npc(id)
    }
}

impl From<PcId> for EntityRef {
    fn from(id: PcId) -> Self {
        Self::Pc(id)
    }
}

impl From<OrganizationId> for EntityRef {
    fn from(id: OrganizationId) -> Self {
        Self::Organization(id)
    }
}
