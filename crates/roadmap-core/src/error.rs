//! Error types for the tracker

use roadmap_catalog::{CatalogError, TaskId};
use roadmap_store::StoreError;

/// Tracker error
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Task identifier not in the catalog
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// Catalog could not be loaded
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Collaborator failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation needs a signed-in user
    #[error("not signed in")]
    NotAuthenticated,

    /// Task has no uploaded document
    #[error("no document attached to {0}")]
    NoAttachment(TaskId),

    /// Deadline text is not a `YYYY-MM-DD` date
    #[error("invalid date {input:?}: {reason}")]
    InvalidDate {
        /// Rejected input
        input: String,
        /// Parser explanation
        reason: String,
    },
}

impl TrackerError {
    /// Transient failures worth retrying later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_store_failures_retry() {
        assert!(TrackerError::from(StoreError::Unavailable("down".into())).is_retryable());
        assert!(!TrackerError::from(StoreError::NotFound("x".into())).is_retryable());
        assert!(!TrackerError::UnknownTask("x".into()).is_retryable());
        assert!(!TrackerError::NotAuthenticated.is_retryable());
    }
}
