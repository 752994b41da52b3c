use thiserror::Error;

/// Top-level error type for Lorekeeper operations.
#[derive(Debug, Error)]
pub enum LorekeeperError {
    // --- Caller-facing outcomes (callers branch on these) ---
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // --- Infrastructure errors (propagated, never retried) ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl LorekeeperError {
    /// Whether the error was caused by the request rather than the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Conflict(_) | Self::Validation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type alias for Lorekeeper operations.
pub type Result<T> = std::result::Result<T, LorekeeperError>;
