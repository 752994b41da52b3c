use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use lorekeeper_common::ids::{CampaignId, RelationshipId, RelationshipTypeId};
use lorekeeper_common::types::{
    type_name_key, EntityRef, NewRelationship, Relationship, RelationshipType, RelationshipUpdate,
};

use crate::catalog::RelationshipTypeSeed;

use super::repository::{RelationshipRepository, StoreFuture};
use super::{RelationshipQuery, RelationshipRecord, StoreError};

/// In-process relationship store with the same semantics as the PostgreSQL schema.
///
/// All state sits behind one `std::sync::Mutex` that is never held across an
/// await point, so duplicate checks and inserts are atomic with respect to
/// each other.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    types: BTreeMap<i64, RelationshipType>,
    next_type_id: i64,
    relationships: BTreeMap<i64, Relationship>,
    next_relationship_id: i64,
    entity_names: HashMap<EntityRef, String>,
    campaign_names: HashMap<CampaignId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a display name for an entity, standing in for the NPC/PC/organization tables.
    pub fn register_entity(&self, entity: EntityRef, name: impl Into<String>) {
        self.lock().entity_names.insert(entity, name.into());
    }

    /// Record a display name for a campaign, standing in for the campaigns table.
    pub fn register_campaign(&self, campaign_id: CampaignId, name: impl Into<String>) {
        self.lock().campaign_names.insert(campaign_id, name.into());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn list_types_now(&self) -> Vec<RelationshipType> {
        let mut types: Vec<RelationshipType> = self.lock().types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    fn provision_now(&self, seeds: &[RelationshipTypeSeed]) -> usize {
        let mut state = self.lock();
        let mut inserted = 0usize;

        for seed in seeds {
            if state.type_id_by_name(seed.name).is_some() {
                continue;
            }
            state.next_type_id += 1;
            let id = state.next_type_id;
            state.types.insert(
                id,
                RelationshipType {
                    id: RelationshipTypeId(id),
                    name: seed.name.to_string(),
                    description: Some(seed.description.to_string()),
                    is_directional: seed.is_directional,
                    inverse_type_id: None,
                    inverse_type_name: None,
                    created_at: Utc::now(),
                },
            );
            inserted += 1;
        }

        for seed in seeds {
            let Some(inverse) = seed.inverse else {
                continue;
            };
            let (Some(type_id), Some(inverse_id)) =
                (state.type_id_by_name(seed.name), state.type_id_by_name(inverse))
            else {
                continue;
            };
            if type_id == inverse_id {
                continue;
            }
            if let Some(t) = state.types.get_mut(&type_id) {
                if t.is_directional && t.inverse_type_id.is_none() {
                    t.inverse_type_id = Some(RelationshipTypeId(inverse_id));
                }
            }
        }

        inserted
    }

    fn insert_now(&self, new: &NewRelationship) -> Result<RelationshipId, StoreError> {
        let mut state = self.lock();

        if !state.types.contains_key(&new.relationship_type_id.0) {
            return Err(StoreError::InvalidReference(format!(
                "insert relationship: relationship type {} does not exist",
                new.relationship_type_id
            )));
        }

        if new.is_active
            && state.active_duplicate(new.source, new.target, new.relationship_type_id, None)
        {
            return Err(StoreError::Conflict(format!(
                "active relationship {} -> {} of type {} already exists",
                new.source, new.target, new.relationship_type_id
            )));
        }

        state.next_relationship_id += 1;
        let id = state.next_relationship_id;
        let now = Utc::now();
        state.relationships.insert(
            id,
            Relationship {
                id: RelationshipId(id),
                source: new.source,
                target: new.target,
                relationship_type_id: new.relationship_type_id,
                description: new.description.clone(),
                strength: new.strength,
                is_active: new.is_active,
                campaign_id: new.campaign_id,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(RelationshipId(id))
    }

    fn get_now(&self, id: RelationshipId) -> Option<RelationshipRecord> {
        let state = self.lock();
        state
            .relationships
            .get(&id.0)
            .map(|relationship| state.record(relationship))
    }

    fn query_now(&self, query: &RelationshipQuery, include_inactive: bool) -> Vec<RelationshipRecord> {
        let state = self.lock();
        let mut matching: Vec<&Relationship> = state
            .relationships
            .values()
            .filter(|r| include_inactive || r.is_active)
            .filter(|r| query.matches(r))
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        matching.into_iter().map(|r| state.record(r)).collect()
    }

    fn update_now(&self, update: &RelationshipUpdate) -> Result<(), StoreError> {
        let mut state = self.lock();

        let Some(current) = state.relationships.get(&update.id.0) else {
            return Ok(());
        };

        if update.is_active
            && state.active_duplicate(
                current.source,
                current.target,
                current.relationship_type_id,
                Some(update.id),
            )
        {
            return Err(StoreError::Conflict(format!(
                "update relationship {}: an active relationship with the same source, target and type already exists",
                update.id
            )));
        }

        if let Some(relationship) = state.relationships.get_mut(&update.id.0) {
            relationship.description = update.description.clone();
            relationship.strength = update.strength;
            relationship.is_active = update.is_active;
            relationship.campaign_id = update.campaign_id;
            relationship.updated_at = Utc::now();
        }

        Ok(())
    }

    fn set_active_now(&self, id: RelationshipId, active: bool) -> Result<(), StoreError> {
        let mut state = self.lock();

        let Some(current) = state.relationships.get(&id.0) else {
            return Ok(());
        };

        if active
            && state.active_duplicate(
                current.source,
                current.target,
                current.relationship_type_id,
                Some(id),
            )
        {
            return Err(StoreError::Conflict(format!(
                "set relationship active {}: an active relationship with the same source, target and type already exists",
                id
            )));
        }

        if let Some(relationship) = state.relationships.get_mut(&id.0) {
            relationship.is_active = active;
            relationship.updated_at = Utc::now();
        }

        Ok(())
    }
}

impl MemoryState {
    fn type_id_by_name(&self, name: &str) -> Option<i64> {
        let key = type_name_key(name);
        self.types
            .values()
            .find(|t| type_name_key(&t.name) == key)
            .map(|t| t.id.0)
    }

    fn active_duplicate(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
        except: Option<RelationshipId>,
    ) -> bool {
        self.relationships.values().any(|r| {
            r.is_active
                && Some(r.id) != except
                && r.source == source
                && r.target == target
                && r.relationship_type_id == relationship_type_id
        })
    }

    fn record(&self, relationship: &Relationship) -> RelationshipRecord {
        RelationshipRecord {
            relationship: relationship.clone(),
            source_name: self.entity_names.get(&relationship.source).cloned(),
            target_name: self.entity_names.get(&relationship.target).cloned(),
            campaign_name: relationship
                .campaign_id
                .and_then(|id| self.campaign_names.get(&id).cloned()),
        }
    }
}

impl RelationshipRepository for MemoryStore {
    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn list_relationship_types(&self) -> StoreFuture<'_, Vec<RelationshipType>> {
        let types = self.list_types_now();
        Box::pin(async move { Ok(types) })
    }

    fn provision_relationship_types<'a>(
        &'a self,
        seeds: &'a [RelationshipTypeSeed],
    ) -> StoreFuture<'a, usize> {
        let inserted = self.provision_now(seeds);
        Box::pin(async move { Ok(inserted) })
    }

    fn insert_relationship<'a>(
        &'a self,
        relationship: &'a NewRelationship,
    ) -> StoreFuture<'a, RelationshipId> {
        let result = self.insert_now(relationship);
        Box::pin(async move { result })
    }

    fn get_relationship(&self, id: RelationshipId) -> StoreFuture<'_, Option<RelationshipRecord>> {
        let record = self.get_now(id);
        Box::pin(async move { Ok(record) })
    }

    fn query_relationships<'a>(
        &'a self,
        query: &'a RelationshipQuery,
        include_inactive: bool,
    ) -> StoreFuture<'a, Vec<RelationshipRecord>> {
        let records = self.query_now(query, include_inactive);
        Box::pin(async move { Ok(records) })
    }

    fn update_relationship<'a>(&'a self, update: &'a RelationshipUpdate) -> StoreFuture<'a, ()> {
        let result = self.update_now(update);
        Box::pin(async move { result })
    }

    fn delete_relationship(&self, id: RelationshipId) -> StoreFuture<'_, ()> {
        self.lock().relationships.remove(&id.0);
        Box::pin(async { Ok(()) })
    }

    fn set_relationship_active(&self, id: RelationshipId, active: bool) -> StoreFuture<'_, ()> {
        let result = self.set_active_now(id, active);
        Box::pin(async move { result })
    }

    fn relationship_exists(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
    ) -> StoreFuture<'_, bool> {
        let exists = self
            .lock()
            .active_duplicate(source, target, relationship_type_id, None);
        Box::pin(async move { Ok(exists) })
    }
}
