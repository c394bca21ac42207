//! Validated catalog with precomputed sequencing
//!
//! Phases and tasks are immutable once loaded. While building, each phase is
//! walked twice (forward and backward) to record, per task, the position of
//! the nearest mandatory task before and after it. Status resolution and
//! unlock planning then become constant-time lookups.

use crate::error::CatalogError;
use crate::types::{PhaseDef, PhaseId, TaskDef, TaskId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a task lives and who its mandatory neighbours are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSlot {
    /// Phase index in catalog order
    pub phase: usize,
    /// Position within the phase
    pub position: usize,
    /// Position of the nearest preceding mandatory task in the same phase
    pub prev_mandatory: Option<usize>,
    /// Position of the nearest following mandatory task in the same phase
    pub next_mandatory: Option<usize>,
}

/// On-disk catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Phases in order
    #[serde(default)]
    pub phases: Vec<PhaseDef>,
}

/// Immutable phase/task catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    phases: Vec<PhaseDef>,
    phase_ids: IndexMap<PhaseId, usize>,
    slots: IndexMap<TaskId, TaskSlot>,
}

impl Catalog {
    /// Validate phases and build the sequencing index
    ///
    /// # Errors
    /// Returns [`CatalogError`] on empty or duplicate identifiers.
    pub fn new(phases: Vec<PhaseDef>) -> Result<Self, CatalogError> {
        let mut phase_ids = IndexMap::with_capacity(phases.len());
        let mut slots = IndexMap::new();

        for (phase_idx, phase) in phases.iter().enumerate() {
            if phase.id.as_str().is_empty() {
                return Err(CatalogError::EmptyPhaseId(phase_idx));
            }
            if phase_ids.insert(phase.id.clone(), phase_idx).is_some() {
                return Err(CatalogError::DuplicatePhase(phase.id.clone()));
            }

            let links = mandatory_neighbours(&phase.tasks);
            for (position, (task, (prev, next))) in phase.tasks.iter().zip(links).enumerate() {
                if task.id.as_str().is_empty() {
                    return Err(CatalogError::EmptyTaskId {
                        phase: phase.id.clone(),
                        position,
                    });
                }
                let slot = TaskSlot {
                    phase: phase_idx,
                    position,
                    prev_mandatory: prev,
                    next_mandatory: next,
                };
                if slots.insert(task.id.clone(), slot).is_some() {
                    return Err(CatalogError::DuplicateTask(task.id.clone()));
                }
            }
        }

        Ok(Self {
            phases,
            phase_ids,
            slots,
        })
    }

    /// Parse a TOML catalog document
    ///
    /// # Errors
    /// Returns [`CatalogError::Parse`] or a validation error.
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = toml::from_str(source)?;
        Self::new(doc.phases)
    }

    /// Read and parse a TOML catalog file
    ///
    /// # Errors
    /// Returns [`CatalogError::Io`] if the file can't be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// All phases in order
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[PhaseDef] {
        &self.phases
    }

    /// Phase by index
    #[inline]
    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&PhaseDef> {
        self.phases.get(index)
    }

    /// Index of a phase by identifier
    #[inline]
    #[must_use]
    pub fn phase_index(&self, id: &PhaseId) -> Option<usize> {
        self.phase_ids.get(id).copied()
    }

    /// Sequencing slot of a task
    #[inline]
    #[must_use]
    pub fn slot(&self, id: &TaskId) -> Option<TaskSlot> {
        self.slots.get(id).copied()
    }

    /// Task definition by identifier
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&TaskDef> {
        let slot = self.slots.get(id)?;
        self.task_at(slot.phase, slot.position)
    }

    /// Task definition by phase index and position
    #[inline]
    #[must_use]
    pub fn task_at(&self, phase: usize, position: usize) -> Option<&TaskDef> {
        self.phases.get(phase)?.tasks.get(position)
    }

    /// Whether the identifier belongs to this catalog
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.slots.contains_key(id)
    }

    /// Iterate all tasks in catalog order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDef> {
        self.phases.iter().flat_map(|p| p.tasks.iter())
    }

    /// Number of phases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// No phases at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Number of tasks across all phases
    #[inline]
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of mandatory tasks across all phases
    #[must_use]
    pub fn mandatory_count(&self) -> usize {
        self.phases.iter().map(PhaseDef::mandatory_count).sum()
    }

    /// Number of optional tasks across all phases
    #[must_use]
    pub fn optional_count(&self) -> usize {
        self.phases.iter().map(PhaseDef::optional_count).sum()
    }
}

/// For every task, the positions of the nearest mandatory task before and after it
fn mandatory_neighbours(tasks: &[TaskDef]) -> Vec<(Option<usize>, Option<usize>)> {
    let mut out = vec![(None, None); tasks.len()];

    let mut last = None;
    for (i, task) in tasks.iter().enumerate() {
        out[i].0 = last;
        if task.mandatory() {
            last = Some(i);
        }
    }

    let mut next = None;
    for (i, task) in tasks.iter().enumerate().rev() {
        out[i].1 = next;
        if task.mandatory() {
            next = Some(i);
        }
    }

    out
}
