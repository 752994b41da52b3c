use std::future::Future;
use std::pin::Pin;

use lorekeeper_common::ids::{RelationshipId, RelationshipTypeId};
use lorekeeper_common::types::{EntityRef, NewRelationship, RelationshipType, RelationshipUpdate};

use crate::catalog::RelationshipTypeSeed;

use super::{RelationshipQuery, RelationshipRecord, StoreClient, StoreError};

/// Boxed future returned by repository methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Storage operations behind the relationship service.
///
/// Object-safe (dyn dispatch) so the service can run over PostgreSQL in
/// production and the in-process `MemoryStore` in tests and local tooling.
pub trait RelationshipRepository: Send + Sync {
    fn health_check(&self) -> StoreFuture<'_, ()>;

    /// All catalog types as stored. Inverse names are not resolved here.
    fn list_relationship_types(&self) -> StoreFuture<'_, Vec<RelationshipType>>;

    /// Insert missing seed types and link inverse pairs. Returns the number inserted.
    fn provision_relationship_types<'a>(
        &'a self,
        seeds: &'a [RelationshipTypeSeed],
    ) -> StoreFuture<'a, usize>;

    /// Insert an edge unless an active edge with the same identity exists.
    /// The check and the insert are atomic; a duplicate yields `StoreError::Conflict`.
    fn insert_relationship<'a>(
        &'a self,
        relationship: &'a NewRelationship,
    ) -> StoreFuture<'a, RelationshipId>;

    fn get_relationship(&self, id: RelationshipId) -> StoreFuture<'_, Option<RelationshipRecord>>;

    fn query_relationships<'a>(
        &'a self,
        query: &'a RelationshipQuery,
        include_inactive: bool,
    ) -> StoreFuture<'a, Vec<RelationshipRecord>>;

    /// Overwrite content fields. Missing ids are a no-op.
    fn update_relationship<'a>(&'a self, update: &'a RelationshipUpdate) -> StoreFuture<'a, ()>;

    /// Remove the row permanently. Missing ids are a no-op.
    fn delete_relationship(&self, id: RelationshipId) -> StoreFuture<'_, ()>;

    /// Toggle `is_active` and refresh `updated_at`. Missing ids are a no-op.
    fn set_relationship_active(&self, id: RelationshipId, active: bool) -> StoreFuture<'_, ()>;

    /// Whether an active edge exists for the exact (source, target, type) tuple.
    fn relationship_exists(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
    ) -> StoreFuture<'_, bool>;
}

impl RelationshipRepository for StoreClient {
    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(StoreClient::health_check(self))
    }

    fn list_relationship_types(&self) -> StoreFuture<'_, Vec<RelationshipType>> {
        Box::pin(StoreClient::list_relationship_types(self))
    }

    fn provision_relationship_types<'a>(
        &'a self,
        seeds: &'a [RelationshipTypeSeed],
    ) -> StoreFuture<'a, usize> {
        Box::pin(StoreClient::provision_relationship_types(self, seeds))
    }

    fn insert_relationship<'a>(
        &'a self,
        relationship: &'a NewRelationship,
    ) -> StoreFuture<'a, RelationshipId> {
        Box::pin(StoreClient::insert_relationship(self, relationship))
    }

    fn get_relationship(&self, id: RelationshipId) -> StoreFuture<'_, Option<RelationshipRecord>> {
        Box::pin(StoreClient::get_relationship(self, id))
    }

    fn query_relationships<'a>(
        &'a self,
        query: &'a RelationshipQuery,
        include_inactive: bool,
    ) -> StoreFuture<'a, Vec<RelationshipRecord>> {
        Box::pin(StoreClient::query_relationships(self, query, include_inactive))
    }

    fn update_relationship<'a>(&'a self, update: &'a RelationshipUpdate) -> StoreFuture<'a, ()> {
        Box::pin(StoreClient::update_relationship(self, update))
    }

    fn delete_relationship(&self, id: RelationshipId) -> StoreFuture<'_, ()> {
        Box::pin(StoreClient::delete_relationship(self, id))
    }

    fn set_relationship_active(&self, id: RelationshipId, active: bool) -> StoreFuture<'_, ()> {
        Box::pin(StoreClient::set_relationship_active(self, id, active))
    }

    fn relationship_exists(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
    ) -> StoreFuture<'_, bool> {
        Box::pin(StoreClient::relationship_exists(
            self,
            source,
            target,
            relationship_type_id,
        ))
    }
}
