use std::sync::Arc;
use std::time::Duration;

use lorekeeper_common::config::{CatalogConfig, RelationshipLimits};
use lorekeeper_common::ids::{CampaignId, RelationshipId, RelationshipTypeId};
use lorekeeper_common::types::{
    EntityRef, NewRelationship, RelationshipDetails, RelationshipType, RelationshipUpdate,
};
use lorekeeper_common::{LorekeeperError, Result};

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::store::{RelationshipQuery, RelationshipRecord, RelationshipRepository, StoreError};

use super::validation::validate_content;

/// Lifecycle and query operations over the relationship graph.
///
/// Type metadata comes from the shared catalog snapshot; the repository only
/// deals in raw edges and display names.
pub struct RelationshipService {
    repo: Arc<dyn RelationshipRepository>,
    catalog: Arc<Catalog>,
    limits: RelationshipLimits,
    miss_refresh_min_age: Duration,
}

impl RelationshipService {
    pub fn new(
        repo: Arc<dyn RelationshipRepository>,
        catalog: Arc<Catalog>,
        limits: RelationshipLimits,
    ) -> Self {
        Self {
            repo,
            catalog,
            limits,
            miss_refresh_min_age: Duration::from_millis(
                CatalogConfig::default().miss_refresh_min_age_ms,
            ),
        }
    }

    /// Minimum snapshot age before a lookup miss reloads the catalog.
    pub fn with_miss_refresh_min_age(mut self, min_age: Duration) -> Self {
        self.miss_refresh_min_age = min_age;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Reload the type catalog. Returns the number of types now known.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        let snapshot = self.catalog.refresh(self.repo.as_ref()).await?;
        Ok(snapshot.len())
    }

    // --- Relationship type catalog ---

    /// All relationship types, each annotated with its inverse name.
    pub async fn list_types(&self) -> Result<Vec<RelationshipType>> {
        let mut snapshot = self.catalog.snapshot();
        if snapshot.is_empty() {
            snapshot = self.refresh_on_miss().await?;
        }
        Ok(snapshot.list().to_vec())
    }

    pub async fn get_type(&self, id: RelationshipTypeId) -> Result<Option<RelationshipType>> {
        self.lookup_type(|snapshot| snapshot.get(id).cloned()).await
    }

    /// Case-insensitive exact lookup by name.
    pub async fn get_type_by_name(&self, name: &str) -> Result<Option<RelationshipType>> {
        self.lookup_type(|snapshot| snapshot.by_name(name).cloned())
            .await
    }

    /// Like `get_type_by_name`, but absence is a `NotFound` error.
    ///
    /// For callers such as account provisioning that must abort when a
    /// required type is missing.
    pub async fn require_type_by_name(&self, name: &str) -> Result<RelationshipType> {
        self.get_type_by_name(name)
            .await?
            .ok_or_else(|| LorekeeperError::NotFound(format!("relationship type '{}'", name)))
    }

    /// Look a type up in the current snapshot, refreshing once on a miss.
    async fn lookup_type<F>(&self, find: F) -> Result<Option<RelationshipType>>
    where
        F: Fn(&CatalogSnapshot) -> Option<RelationshipType>,
    {
        if let Some(found) = find(&self.catalog.snapshot()) {
            return Ok(Some(found));
        }
        let snapshot = self.refresh_on_miss().await?;
        Ok(find(&snapshot))
    }

    /// Reload the catalog unless the snapshot is younger than the miss threshold.
    async fn refresh_on_miss(&self) -> Result<Arc<CatalogSnapshot>> {
        Ok(self
            .catalog
            .refresh_if_older_than(self.repo.as_ref(), self.miss_refresh_min_age)
            .await?)
    }

    // --- Lifecycle ---

    /// Create a relationship and return its id.
    ///
    /// Fails with `Validation` for an unknown type or out-of-range content and
    /// with `Conflict` when an active relationship with the same source,
    /// target and type already exists.
    pub async fn create(&self, relationship: &NewRelationship) -> Result<RelationshipId> {
        validate_content(
            relationship.description.as_deref(),
            relationship.strength,
            &self.limits,
        )?;

        if self.get_type(relationship.relationship_type_id).await?.is_none() {
            return Err(LorekeeperError::Validation(format!(
                "unknown relationship type {}",
                relationship.relationship_type_id
            )));
        }

        match self.repo.insert_relationship(relationship).await {
            Ok(id) => {
                tracing::info!(
                    relationship_id = %id,
                    source = %relationship.source,
                    target = %relationship.target,
                    relationship_type_id = %relationship.relationship_type_id,
                    "Relationship created"
                );
                Ok(id)
            }
            Err(e @ StoreError::Conflict(_)) => {
                tracing::warn!(
                    source = %relationship.source,
                    target = %relationship.target,
                    relationship_type_id = %relationship.relationship_type_id,
                    "Duplicate active relationship rejected"
                );
                Err(e.into())
            }
            Err(e) => Err(log_failure("create", e)),
        }
    }

    /// Fetch a relationship with display metadata, active or not.
    pub async fn get(&self, id: RelationshipId) -> Result<Option<RelationshipDetails>> {
        let record = self
            .repo
            .get_relationship(id)
            .await
            .map_err(|e| log_failure("get", e))?;

        match record {
            Some(record) => {
                let snapshot = self.snapshot_covering(std::slice::from_ref(&record)).await?;
                Ok(Some(annotate(&snapshot, record)))
            }
            None => Ok(None),
        }
    }

    /// Overwrite description, strength, active flag and campaign.
    /// A missing id is not an error.
    pub async fn update(&self, update: &RelationshipUpdate) -> Result<()> {
        validate_content(update.description.as_deref(), update.strength, &self.limits)?;

        self.repo
            .update_relationship(update)
            .await
            .map_err(|e| log_failure("update", e))?;

        tracing::info!(relationship_id = %update.id, "Relationship updated");
        Ok(())
    }

    /// Permanently remove a relationship. Idempotent.
    pub async fn delete(&self, id: RelationshipId) -> Result<()> {
        self.repo
            .delete_relationship(id)
            .await
            .map_err(|e| log_failure("delete", e))?;

        tracing::info!(relationship_id = %id, "Relationship deleted");
        Ok(())
    }

    /// Hide a relationship without removing it.
    pub async fn deactivate(&self, id: RelationshipId) -> Result<()> {
        self.repo
            .set_relationship_active(id, false)
            .await
            .map_err(|e| log_failure("deactivate", e))?;

        tracing::info!(relationship_id = %id, "Relationship deactivated");
        Ok(())
    }

    /// Restore a deactivated relationship.
    pub async fn reactivate(&self, id: RelationshipId) -> Result<()> {
        self.repo
            .set_relationship_active(id, true)
            .await
            .map_err(|e| log_failure("reactivate", e))?;

        tracing::info!(relationship_id = %id, "Relationship reactivated");
        Ok(())
    }

    /// Whether an active relationship exists for the exact (source, target, type) tuple.
    pub async fn exists(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
    ) -> Result<bool> {
        self.repo
            .relationship_exists(source, target, relationship_type_id)
            .await
            .map_err(|e| log_failure("exists", e))
    }

    // --- Queries ---

    /// Run any query shape. Results are newest first.
    pub async fn query(
        &self,
        query: &RelationshipQuery,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        let records = self
            .repo
            .query_relationships(query, include_inactive)
            .await
            .map_err(|e| log_failure(query.label(), e))?;

        tracing::debug!(
            shape = query.label(),
            include_inactive,
            results = records.len(),
            "Relationship query"
        );

        let snapshot = self.snapshot_covering(&records).await?;
        Ok(records
            .into_iter()
            .map(|record| annotate(&snapshot, record))
            .collect())
    }

    /// Everything connected to an entity, whichever side it is on.
    pub async fn for_entity(
        &self,
        entity: EntityRef,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        self.query(&RelationshipQuery::ForEntity(entity), include_inactive)
            .await
    }

    /// Relationships where the entity is the source.
    pub async fn from_entity(
        &self,
        entity: EntityRef,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        self.query(&RelationshipQuery::FromEntity(entity), include_inactive)
            .await
    }

    /// Relationships where the entity is the target.
    pub async fn to_entity(
        &self,
        entity: EntityRef,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        self.query(&RelationshipQuery::ToEntity(entity), include_inactive)
            .await
    }

    pub async fn by_type(
        &self,
        entity: EntityRef,
        relationship_type_id: RelationshipTypeId,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        let query = RelationshipQuery::ByType {
            entity,
            relationship_type_id,
        };
        self.query(&query, include_inactive).await
    }

    pub async fn by_campaign(
        &self,
        campaign_id: CampaignId,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipDetails>> {
        self.query(&RelationshipQuery::ByCampaign(campaign_id), include_inactive)
            .await
    }

    /// Current snapshot, refreshed once if it lacks a type the records use.
    async fn snapshot_covering(
        &self,
        records: &[RelationshipRecord],
    ) -> Result<Arc<CatalogSnapshot>> {
        let snapshot = self.catalog.snapshot();
        let missing = records
            .iter()
            .any(|r| snapshot.get(r.relationship.relationship_type_id).is_none());

        if missing {
            self.refresh_on_miss().await
        } else {
            Ok(snapshot)
        }
    }
}

fn annotate(snapshot: &CatalogSnapshot, record: RelationshipRecord) -> RelationshipDetails {
    let rel_type = snapshot.get(record.relationship.relationship_type_id);

    RelationshipDetails {
        relationship_type_name: rel_type.map(|t| t.name.clone()),
        is_directional: rel_type.is_some_and(|t| t.is_directional),
        inverse_type_name: rel_type.and_then(|t| t.inverse_type_name.clone()),
        source_name: record.source_name,
        target_name: record.target_name,
        campaign_name: record.campaign_name,
        relationship: record.relationship,
    }
}

fn log_failure(operation: &str, e: StoreError) -> LorekeeperError {
    match e {
        StoreError::Conflict(_) | StoreError::InvalidReference(_) => e.into(),
        other => {
            tracing::error!(operation, error = %other, "Relationship storage failure");
            other.into()
        }
    }
}
