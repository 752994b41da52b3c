use std::collections::HashSet;

use lorekeeper_common::types::type_name_key;

use crate::store::{RelationshipRepository, StoreError};

/// A relationship type to provision, with its inverse named rather than numbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationshipTypeSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub is_directional: bool,
    pub inverse: Option<&'static str>,
}

const fn symmetric(name: &'static str, description: &'static str) -> RelationshipTypeSeed {
    RelationshipTypeSeed {
        name,
        description,
        is_directional: false,
        inverse: None,
    }
}

const fn directional(
    name: &'static str,
    description: &'static str,
    inverse: &'static str,
) -> RelationshipTypeSeed {
    RelationshipTypeSeed {
        name,
        description,
        is_directional: true,
        inverse: Some(inverse),
    }
}

/// The vocabulary every new deployment starts with.
pub const DEFAULT_RELATIONSHIP_TYPES: &[RelationshipTypeSeed] = &[
    symmetric("Friend", "Close personal friends"),
    symmetric("Ally", "Allied in purpose, if not in affection"),
    symmetric("Enemy", "Openly hostile to one another"),
    symmetric("Rival", "Competing for the same goal or standing"),
    symmetric("Family", "Related by blood or bond"),
    symmetric("Romantic", "Romantically involved"),
    symmetric("Acquaintance", "Know each other in passing"),
    symmetric("Business Partner", "Share a business or venture"),
    directional("Mentor", "Teaches or guides the target", "Student"),
    directional("Student", "Learns from the target", "Mentor"),
    directional("Employer", "Employs the target", "Employee"),
    directional("Employee", "Works for the target", "Employer"),
    directional("Leader", "Leads the target", "Follower"),
    directional("Follower", "Follows the target", "Leader"),
    directional("Patron", "Sponsors or commissions the target", "Client"),
    directional("Client", "Is sponsored by the target", "Patron"),
    directional("Protector", "Guards the target", "Ward"),
    directional("Ward", "Is guarded by the target", "Protector"),
];

/// Check a seed list for internal consistency before provisioning it.
///
/// Names must be unique (case-insensitive), only directional types may name
/// an inverse, an inverse must be another type in the same list, and it must
/// itself be directional.
pub fn validate_seeds(seeds: &[RelationshipTypeSeed]) -> Result<(), String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for seed in seeds {
        if seed.name.trim().is_empty() {
            errors.push("relationship type name must not be empty".to_string());
        }
        if !seen.insert(type_name_key(seed.name)) {
            errors.push(format!("duplicate relationship type '{}'", seed.name));
        }
    }

    for seed in seeds {
        let Some(inverse) = seed.inverse else {
            continue;
        };
        if !seed.is_directional {
            errors.push(format!(
                "'{}' is not directional but names inverse '{}'",
                seed.name, inverse
            ));
            continue;
        }
        if type_name_key(inverse) == type_name_key(seed.name) {
            errors.push(format!("'{}' cannot be its own inverse", seed.name));
            continue;
        }
        match seeds
            .iter()
            .find(|s| type_name_key(s.name) == type_name_key(inverse))
        {
            Some(target) if target.is_directional => {}
            Some(_) => errors.push(format!(
                "inverse '{}' of '{}' must be directional",
                inverse, seed.name
            )),
            None => errors.push(format!(
                "inverse '{}' of '{}' is not in the seed list",
                inverse, seed.name
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Provision the default vocabulary. Safe to run on every startup.
pub async fn provision_default_types(repo: &dyn RelationshipRepository) -> Result<usize, StoreError> {
    validate_seeds(DEFAULT_RELATIONSHIP_TYPES).map_err(StoreError::InvalidReference)?;
    repo.provision_relationship_types(DEFAULT_RELATIONSHIP_TYPES)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_seeds_are_consistent() {
        validate_seeds(DEFAULT_RELATIONSHIP_TYPES).unwrap();
    }

    #[test]
    fn test_default_seeds_include_required_types() {
        // Account provisioning links its starter NPCs as allies.
        for name in ["Ally", "Friend", "Enemy", "Rival", "Mentor", "Student"] {
            assert!(
                DEFAULT_RELATIONSHIP_TYPES.iter().any(|s| s.name == name),
                "missing {}",
                name
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_inverses() {
        let seeds = [
            symmetric("Ally", "a"),
            RelationshipTypeSeed {
                name: "Enemy",
                description: "e",
                is_directional: false,
                inverse: Some("Ally"),
            },
            directional("Mentor", "m", "Mentor"),
            directional("Patron", "p", "Client"),
            directional("Leader", "l", "Ally"),
            symmetric("ally", "dup"),
        ];

        let err = validate_seeds(&seeds).unwrap_err();
        assert!(err.contains("'Enemy' is not directional"));
        assert!(err.contains("'Mentor' cannot be its own inverse"));
        assert!(err.contains("inverse 'Client' of 'Patron' is not in the seed list"));
        assert!(err.contains("inverse 'Ally' of 'Leader' must be directional"));
        assert!(err.contains("duplicate relationship type 'ally'"));
    }

    #[tokio::test]
    async fn test_provision_default_types_into_memory_store() {
        let store = MemoryStore::new();
        let inserted = provision_default_types(&store).await.unwrap();
        assert_eq!(inserted, DEFAULT_RELATIONSHIP_TYPES.len());

        let again = provision_default_types(&store).await.unwrap();
        assert_eq!(again, 0);
    }
}
