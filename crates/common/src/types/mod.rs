mod entity;
mod relationship;
mod relationship_type;

pub use entity::*;
pub use relationship::*;
pub use relationship_type::*;
