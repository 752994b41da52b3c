use lorekeeper_common::config::RelationshipLimits;
use lorekeeper_common::{LorekeeperError, Result};

/// Check the mutable content of a relationship against the configured limits.
pub fn validate_content(
    description: Option<&str>,
    strength: Option<i32>,
    limits: &RelationshipLimits,
) -> Result<()> {
    if let Some(strength) = strength {
        if !(limits.min_strength..=limits.max_strength).contains(&strength) {
            return Err(LorekeeperError::Validation(format!(
                "strength {} is outside {}..={}",
                strength, limits.min_strength, limits.max_strength
            )));
        }
    }

    if let Some(description) = description {
        let chars = description.chars().count();
        if chars > limits.max_description_chars as usize {
            return Err(LorekeeperError::Validation(format!(
                "description is {} characters, max is {}",
                chars, limits.max_description_chars
            )));
        }
    }

    Ok(())
}
