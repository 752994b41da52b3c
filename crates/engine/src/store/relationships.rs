use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use lorekeeper_common::ids::{CampaignId, RelationshipId, RelationshipTypeId};
use lorekeeper_common::types::{
    EntityRef, NewRelationship, Relationship, RelationshipUpdate,
};

use super::{RelationshipQuery, RelationshipRecord, StoreClient, StoreError};

/// Edge columns plus the display names resolved through `entity_names` and `campaigns`.
const SELECT_RELATIONSHIPS: &str = r#"
    SELECT r.id, r.source_kind, r.source_id, r.target_kind, r.target_id,
           r.relationship_type_id, r.description, r.strength, r.is_active,
           r.campaign_id, r.created_at, r.updated_at,
           src.name AS source_name, tgt.name AS target_name, c.name AS campaign_name
    FROM entity_relationships r
    LEFT JOIN entity_names src ON src.kind = r.source_kind AND src.id = r.source_id
    LEFT JOIN entity_names tgt ON tgt.kind = r.target_kind AND tgt.id = r.target_id
    LEFT JOIN campaigns c ON c.id = r.campaign_id
"#;

impl StoreClient {
    /// Insert a relationship unless an active one with the same identity exists.
    ///
    /// Single statement against the partial unique index, so two concurrent
    /// identical creates cannot both succeed.
    pub async fn insert_relationship(
        &self,
        relationship: &NewRelationship,
    ) -> Result<RelationshipId, StoreError> {
        let start = std::time::Instant::now();
        let now = Utc::now();

        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO entity_relationships (source_kind, source_id, target_kind, target_id,
                                              relationship_type_id, description, strength,
                                              is_active, campaign_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (source_kind, source_id, target_kind, target_id, relationship_type_id)
                WHERE is_active
                DO NOTHING
            RETURNING id
            "#,
        )
        .bind(relationship.source.kind().as_db_str())
        .bind(relationship.source.id())
        .bind(relationship.target.kind().as_db_str())
        .bind(relationship.target.id())
        .bind(relationship.relationship_type_id.0)
        .bind(&relationship.description)
        .bind(relationship.strength)
        .bind(relationship.is_active)
        .bind(relationship.campaign_id.map(|id| id.0))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "insert relationship"))?;

        metrics::histogram!("store.relationship.create.latency")
            .record(start.elapsed().as_secs_f64());

        match inserted {
            Some((id,)) => Ok(RelationshipId(id)),
            None => {
                metrics::counter!("store.relationship.conflicts").increment(1);
                Err(StoreError::Conflict(format!(
                    "active relationship {} -> {} of type {} already exists",
                    relationship.source, relationship.target, relationship.relationship_type_id
                )))
            }
        }
    }

    /// Retrieve a relationship by ID, active or not.
    pub async fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<RelationshipRecord>, StoreError> {
        let row = sqlx::query_as::<_, RelationshipRow>(&format!(
            "{} WHERE r.id = $1",
            SELECT_RELATIONSHIPS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(RelationshipRecord::try_from).transpose()
    }

    /// Run one of the relationship query shapes, newest first.
    pub async fn query_relationships(
        &self,
        query: &RelationshipQuery,
        include_inactive: bool,
    ) -> Result<Vec<RelationshipRecord>, StoreError> {
        let start = std::time::Instant::now();

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_RELATIONSHIPS);
        qb.push(" WHERE ");

        match query {
            RelationshipQuery::ForEntity(entity) => push_either_side(&mut qb, entity),
            RelationshipQuery::FromEntity(entity) => push_side(&mut qb, "source", entity),
            RelationshipQuery::ToEntity(entity) => push_side(&mut qb, "target", entity),
            RelationshipQuery::ByType {
                entity,
                relationship_type_id,
            } => {
                push_either_side(&mut qb, entity);
                qb.push(" AND r.relationship_type_id = ");
                qb.push_bind(relationship_type_id.0);
            }
            RelationshipQuery::ByCampaign(campaign_id) => {
                qb.push("r.campaign_id = ");
                qb.push_bind(campaign_id.0);
            }
        }

        if !include_inactive {
            qb.push(" AND r.is_active");
        }
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");

        let rows = qb
            .build_query_as::<RelationshipRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        metrics::histogram!("store.relationship.query.latency", "shape" => query.label())
            .record(start.elapsed().as_secs_f64());

        rows.into_iter().map(RelationshipRecord::try_from).collect()
    }

    /// Overwrite the content fields of a relationship. Identity is never touched.
    pub async fn update_relationship(&self, update: &RelationshipUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE entity_relationships
            SET description = $2,
                strength = $3,
                is_active = $4,
                campaign_id = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(update.id.0)
        .bind(&update.description)
        .bind(update.strength)
        .bind(update.is_active)
        .bind(update.campaign_id.map(|id| id.0))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "update relationship"))?;

        if result.rows_affected() == 0 {
            tracing::debug!(relationship_id = %update.id, "Update matched no relationship");
        }

        Ok(())
    }

    /// Permanently remove a relationship.
    pub async fn delete_relationship(&self, id: RelationshipId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM entity_relationships WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Set the active flag. Reactivating next to an active duplicate is a conflict.
    pub async fn set_relationship_active(
        &self,
        id: RelationshipId,
        active: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE entity_relationships
            SET is_active = $2,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "set relationship active"))?;

        Ok(())
    }

    /// Whether an active relationship exists for the exact (source, target, type) tuple.
    pub async fn relationship_exists(
        &self,
        source: EntityRef,
        target: EntityRef,
        relationship_type_id: RelationshipTypeId,
    ) -> Result<bool, StoreError> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM entity_relationships
                WHERE source_kind = $1 AND source_id = $2
                  AND target_kind = $3 AND target_id = $4
                  AND relationship_type_id = $5
                  AND is_active
            )
            "#,
        )
        .bind(source.kind().as_db_str())
        .bind(source.id())
        .bind(target.kind().as_db_str())
        .bind(target.id())
        .bind(relationship_type_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.0)
    }
}

fn push_side(qb: &mut QueryBuilder<'_, Postgres>, side: &str, entity: &EntityRef) {
    qb.push(format!("(r.{side}_kind = "));
    qb.push_bind(entity.kind().as_db_str());
    qb.push(format!(" AND r.{side}_id = "));
    qb.push_bind(entity.id());
    qb.push(")");
}

fn push_either_side(qb: &mut QueryBuilder<'_, Postgres>, entity: &EntityRef) {
    qb.push("(");
    push_side(qb, "source", entity);
    qb.push(" OR ");
    push_side(qb, "target", entity);
    qb.push(")");
}

/// Internal row type for sqlx deserialization.
#[derive(sqlx::FromRow)]
struct RelationshipRow {
    id: i64,
    source_kind: String,
    source_id: i64,
    target_kind: String,
    target_id: i64,
    relationship_type_id: i64,
    description: Option<String>,
    strength: Option<i32>,
    is_active: bool,
    campaign_id: Option<i64>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    source_name: Option<String>,
    target_name: Option<String>,
    campaign_name: Option<String>,
}

impl TryFrom<RelationshipRow> for RelationshipRecord {
    type Error = StoreError;

    fn try_from(row: RelationshipRow) -> Result<Self, Self::Error> {
        let source = EntityRef::from_parts(&row.source_kind, row.source_id)
            .map_err(|e| StoreError::Corrupt(format!("relationship {}: {}", row.id, e)))?;
        let target = EntityRef::from_parts(&row.target_kind, row.target_id)
            .map_err(|e| StoreError::Corrupt(format!("relationship {}: {}", row.id, e)))?;

        Ok(Self {
            relationship: Relationship {
                id: RelationshipId(row.id),
                source,
                target,
                relationship_type_id: RelationshipTypeId(row.relationship_type_id),
                description: row.description,
                strength: row.strength,
                is_active: row.is_active,
                campaign_id: row.campaign_id.map(CampaignId),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            source_name: row.source_name,
            target_name: row.target_name,
            campaign_name: row.campaign_name,
        })
    }
}
