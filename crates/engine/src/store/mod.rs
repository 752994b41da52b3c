mod memory;
mod query;
mod relationship_types;
mod relationships;
mod repository;

pub use memory::MemoryStore;
pub use query::RelationshipQuery;
pub use repository::{RelationshipRepository, StoreFuture};

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use lorekeeper_common::config::DatabaseConfig;
use lorekeeper_common::types::Relationship;

/// PostgreSQL client for the relationship type catalog and edge store.
pub struct StoreClient {
    pool: PgPool,
}

impl StoreClient {
    /// Connect to PostgreSQL and return a client with a connection pool.
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        tracing::info!(
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let client = Self { pool };
        client.health_check().await?;
        tracing::info!("PostgreSQL connection established");

        Ok(client)
    }

    /// Verify the connection is alive.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running PostgreSQL migrations");

        sqlx::migrate!("src/store/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("PostgreSQL migrations complete");
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// A stored relationship plus the names its display view needs.
///
/// Type metadata is not included; it comes from the catalog snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipRecord {
    pub relationship: Relationship,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
    pub campaign_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("PostgreSQL connection error: {0}")]
    Connection(String),

    #[error("PostgreSQL query error: {0}")]
    Query(String),

    #[error("PostgreSQL migration error: {0}")]
    Migration(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

// SQLSTATE codes that correspond to caller mistakes rather than storage failures.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl StoreError {
    /// Classify a sqlx error, keeping constraint violations distinguishable.
    pub(crate) fn from_sqlx(e: sqlx::Error, context: &str) -> Self {
        let code = e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => Self::Conflict(format!(
                "{}: an active relationship with the same source, target and type already exists",
                context
            )),
            Some(FOREIGN_KEY_VIOLATION) => Self::InvalidReference(format!(
                "{}: referenced relationship type does not exist",
                context
            )),
            _ => Self::Query(format!("{}: {}", context, e)),
        }
    }
}

impl From<StoreError> for lorekeeper_common::LorekeeperError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => lorekeeper_common::LorekeeperError::Conflict(msg),
            StoreError::InvalidReference(msg) => {
                lorekeeper_common::LorekeeperError::Validation(msg)
            }
            other => lorekeeper_common::LorekeeperError::Storage(other.to_string()),
        }
    }
}
