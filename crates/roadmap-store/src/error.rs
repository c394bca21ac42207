//! Error types for the storage collaborators

use roadmap_catalog::TaskId;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend not reachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend refused a single record
    #[error("write rejected for {task_id}: {reason}")]
    Rejected {
        /// Task whose record was refused
        task_id: TaskId,
        /// Backend explanation
        reason: String,
    },

    /// Referenced item does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Cache key contains characters that can't be stored
    #[error("invalid cache key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Transient failures worth retrying later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
