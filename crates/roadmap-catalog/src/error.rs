//! Catalog load errors
//!
//! All of these are data-integrity failures detected while a catalog is
//! being built. A loaded [`crate::Catalog`] cannot produce them.

use crate::types::{PhaseId, TaskId};

/// Catalog validation and parsing errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A task identifier appears more than once
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),

    /// A phase identifier appears more than once
    #[error("duplicate phase id: {0}")]
    DuplicatePhase(PhaseId),

    /// Empty task identifier
    #[error("empty task id in phase {phase} at position {position}")]
    EmptyTaskId { phase: PhaseId, position: usize },

    /// Empty phase identifier
    #[error("empty phase id at position {0}")]
    EmptyPhaseId(usize),

    /// Catalog document could not be parsed
    #[error("invalid catalog document: {0}")]
    Parse(#[from] toml::de::Error),

    /// Catalog file could not be read
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}
