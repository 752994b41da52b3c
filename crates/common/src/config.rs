use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub database: DatabaseConfig,
    pub relationships: RelationshipLimits,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// PostgreSQL pool and setup behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Max connections in the sqlx pool.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing.
    pub acquire_timeout_seconds: u64,
    /// Run embedded migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    /// Insert the default relationship vocabulary if missing.
    #[serde(default = "default_true")]
    pub provision_default_types: bool,
}

/// Bounds applied to relationship content on create and update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationshipLimits {
    /// Lowest accepted strength rating (inclusive).
    pub min_strength: i32,
    /// Highest accepted strength rating (inclusive).
    pub max_strength: i32,
    /// Max characters in a relationship description.
    pub max_description_chars: u32,
}

impl Default for RelationshipLimits {
    fn default() -> Self {
        Self {
            min_strength: 1,
            max_strength: 10,
            max_description_chars: 2000,
        }
    }
}

/// Relationship type catalog snapshot behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Interval for background catalog refresh. 0 disables the task.
    #[serde(default)]
    pub refresh_interval_seconds: u64,
    /// A lookup miss reloads the catalog only if the snapshot is at least this old.
    #[serde(default = "default_miss_refresh_min_age_ms")]
    pub miss_refresh_min_age_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 0,
            miss_refresh_min_age_ms: default_miss_refresh_min_age_ms(),
        }
    }
}

fn default_miss_refresh_min_age_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
