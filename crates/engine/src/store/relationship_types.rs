use chrono::Utc;

use lorekeeper_common::ids::RelationshipTypeId;
use lorekeeper_common::types::RelationshipType;

use crate::catalog::RelationshipTypeSeed;

use super::{StoreClient, StoreError};

impl StoreClient {
    /// List every relationship type, ordered by name.
    pub async fn list_relationship_types(&self) -> Result<Vec<RelationshipType>, StoreError> {
        let rows = sqlx::query_as::<_, RelationshipTypeRow>(
            r#"
            SELECT id, name, description, is_directional, inverse_type_id, created_at
            FROM relationship_types
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert seed types that are not present yet (matched by lowercase name),
    /// then link inverse pairs that are still unlinked. Runs in one transaction.
    pub async fn provision_relationship_types(
        &self,
        seeds: &[RelationshipTypeSeed],
    ) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut inserted = 0usize;
        for seed in seeds {
            let result = sqlx::query(
                r#"
                INSERT INTO relationship_types (name, description, is_directional, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT ((LOWER(name))) DO NOTHING
                "#,
            )
            .bind(seed.name)
            .bind(seed.description)
            .bind(seed.is_directional)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "provision relationship type"))?;

            inserted += result.rows_affected() as usize;
        }

        for seed in seeds {
            let Some(inverse) = seed.inverse else {
                continue;
            };

            sqlx::query(
                r#"
                UPDATE relationship_types t
                SET inverse_type_id = i.id
                FROM relationship_types i
                WHERE LOWER(t.name) = LOWER($1)
                  AND LOWER(i.name) = LOWER($2)
                  AND t.is_directional
                  AND t.inverse_type_id IS NULL
                  AND t.id <> i.id
                "#,
            )
            .bind(seed.name)
            .bind(inverse)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "link inverse relationship type"))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(
            seeds = seeds.len(),
            inserted,
            "Relationship type catalog provisioned"
        );

        Ok(inserted)
    }
}

/// Internal row type for sqlx deserialization.
#[derive(sqlx::FromRow)]
struct RelationshipTypeRow {
    id: i64,
    name: String,
    description: Option<String>,
    is_directional: bool,
    inverse_type_id: Option<i64>,
    created_at: chrono::DateTime<Utc>,
}

impl From<RelationshipTypeRow> for RelationshipType {
    fn from(row: RelationshipTypeRow) -> Self {
        Self {
            id: RelationshipTypeId(row.id),
            name: row.name,
            description: row.description,
            is_directional: row.is_directional,
            inverse_type_id: row.inverse_type_id.map(RelationshipTypeId),
            inverse_type_name: None,
            created_at: row.created_at,
        }
    }
}
