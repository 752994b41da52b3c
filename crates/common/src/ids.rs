use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(NpcId, "Typed wrapper for non-player character ids.");
define_id!(PcId, "Typed wrapper for player character ids.");
define_id!(OrganizationId, "Typed wrapper for organization ids.");
define_id!(CampaignId, "Typed wrapper for campaign ids.");
define_id!(
    RelationshipId,
    "Typed wrapper for relationship (edge) ids in the relationship graph."
);
define_id!(
    RelationshipTypeId,
    "Typed wrapper for relationship type ids in the type catalog."
);
