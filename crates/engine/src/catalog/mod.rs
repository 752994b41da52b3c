mod defaults;
mod refresh;

pub use defaults::{provision_default_types, validate_seeds, RelationshipTypeSeed, DEFAULT_RELATIONSHIP_TYPES};
pub use refresh::spawn_refresh_task;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use lorekeeper_common::ids::RelationshipTypeId;
use lorekeeper_common::types::{type_name_key, RelationshipType};

use crate::store::{RelationshipRepository, StoreError};

/// Immutable view of the relationship type catalog.
///
/// Inverse names are resolved once when the snapshot is built, so reads never
/// re-join the catalog.
#[derive(Debug)]
pub struct CatalogSnapshot {
    types: Vec<RelationshipType>,
    by_id: HashMap<RelationshipTypeId, usize>,
    by_name: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
    loaded: Instant,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self::from_types(Vec::new())
    }

    /// Build a snapshot, resolving each directional type's inverse name.
    pub fn from_types(mut types: Vec<RelationshipType>) -> Self {
        types.sort_by(|a, b| a.name.cmp(&b.name));

        let names: HashMap<RelationshipTypeId, String> =
            types.iter().map(|t| (t.id, t.name.clone())).collect();

        for t in &mut types {
            t.inverse_type_name = match t.inverse_type_id {
                Some(inverse_id) if t.is_directional && inverse_id != t.id => {
                    let name = names.get(&inverse_id).cloned();
                    if name.is_none() {
                        tracing::warn!(
                            type_id = %t.id,
                            inverse_type_id = %inverse_id,
                            "Relationship type references a missing inverse"
                        );
                    }
                    name
                }
                Some(inverse_id) => {
                    tracing::warn!(
                        type_id = %t.id,
                        inverse_type_id = %inverse_id,
                        "Ignoring inverse on non-directional or self-inverse relationship type"
                    );
                    None
                }
                None => None,
            };
        }

        let by_id = types.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        let by_name = types
            .iter()
            .enumerate()
            .map(|(i, t)| (type_name_key(&t.name), i))
            .collect();

        Self {
            types,
            by_id,
            by_name,
            loaded_at: Utc::now(),
            loaded: Instant::now(),
        }
    }

    /// All types ordered by name, each annotated with its inverse name.
    pub fn list(&self) -> &[RelationshipType] {
        &self.types
    }

    pub fn get(&self, id: RelationshipTypeId) -> Option<&RelationshipType> {
        self.by_id.get(&id).map(|&i| &self.types[i])
    }

    /// Case-insensitive exact name lookup.
    pub fn by_name(&self, name: &str) -> Option<&RelationshipType> {
        self.by_name
            .get(&type_name_key(name))
            .map(|&i| &self.types[i])
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Time since this snapshot was built.
    pub fn age(&self) -> Duration {
        self.loaded.elapsed()
    }
}

/// Shared handle to the current catalog snapshot.
///
/// Readers clone the `Arc` and keep a consistent view for as long as they
/// need it. A refresh builds a complete new snapshot before swapping it in.
/// Refreshes are serialized, so a slow reload never replaces a newer snapshot.
pub struct Catalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    refresh_lock: Mutex<()>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_snapshot(CatalogSnapshot::empty())
    }

    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        snapshot
    }

    /// Reload the catalog from storage and swap in the new snapshot.
    pub async fn refresh(
        &self,
        repo: &dyn RelationshipRepository,
    ) -> Result<Arc<CatalogSnapshot>, StoreError> {
        let _guard = self.refresh_lock.lock().await;
        self.reload(repo).await
    }

    /// Reload only if the current snapshot is empty or at least `min_age` old.
    ///
    /// Used on lookup misses. Callers that queued behind a reload see the
    /// fresh snapshot and skip their own.
    pub async fn refresh_if_older_than(
        &self,
        repo: &dyn RelationshipRepository,
        min_age: Duration,
    ) -> Result<Arc<CatalogSnapshot>, StoreError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.snapshot();
        if !current.is_empty() && current.age() < min_age {
            metrics::counter!("catalog.refreshes_skipped").increment(1);
            return Ok(current);
        }
        self.reload(repo).await
    }

    async fn reload(
        &self,
        repo: &dyn RelationshipRepository,
    ) -> Result<Arc<CatalogSnapshot>, StoreError> {
        let types = repo.list_relationship_types().await?;
        let snapshot = self.replace(CatalogSnapshot::from_types(types));

        metrics::counter!("catalog.refreshes").increment(1);
        tracing::debug!(types = snapshot.len(), "Relationship type catalog refreshed");

        Ok(snapshot)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
