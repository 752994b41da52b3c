mod service;
mod validation;

pub use crate::store::RelationshipQuery;
pub use service::RelationshipService;
pub use validation::validate_content;
