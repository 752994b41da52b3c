pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use error::{LorekeeperError, Result};
pub use ids::*;
