use lorekeeper_common::config::SystemConfig;

use super::loader::ConfigError;

/// Validate the system configuration.
///
/// Collects every violation so a misconfigured deployment sees all of them
/// at once. The engine refuses to start on validation failure.
pub fn validate(config: &SystemConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_database(config, &mut errors);
    validate_relationships(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_database(config: &SystemConfig, errors: &mut Vec<String>) {
    let d = &config.database;

    if d.max_connections == 0 {
        errors.push("database.max_connections must be > 0".into());
    }
    if d.acquire_timeout_seconds == 0 {
        errors.push("database.acquire_timeout_seconds must be > 0".into());
    }
}

fn validate_relationships(config: &SystemConfig, errors: &mut Vec<String>) {
    let r = &config.relationships;

    if r.max_strength < r.min_strength {
        errors.push("relationships.max_strength must be >= min_strength".into());
    }
    if r.max_description_chars == 0 {
        errors.push("relationships.max_description_chars must be > 0".into());
    }
}
