//! Status resolution
//!
//! Derives the status shown for a task from the catalog and the progress
//! map. Pure: nothing is written, and the same inputs always give the same
//! output.
//!
//! Rules, first match wins:
//! 1. A persisted record is authoritative.
//! 2. Optional tasks are `active`.
//! 3. The first task of a phase is `active`.
//! 4. A mandatory task with no mandatory task before it is `active`.
//! 5. Otherwise `active` iff the nearest preceding mandatory task is
//!    completed, else `blocked`.

use crate::record::ProgressMap;
use roadmap_catalog::{Catalog, Status, TaskId, TaskSlot};

/// A task together with its effective status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    /// Task identifier
    pub id: TaskId,
    /// Effective status
    pub status: Status,
    /// Whether the task participates in the unlock chain
    pub mandatory: bool,
}

/// Effective status of a task
///
/// Returns `None` only when the task isn't part of the catalog.
#[must_use]
pub fn resolve(catalog: &Catalog, task: &TaskId, progress: &ProgressMap) -> Option<Status> {
    let slot = catalog.slot(task)?;
    Some(resolve_slot(catalog, slot, progress))
}

/// Effective status of every task in a phase, in phase order
///
/// An out-of-range index yields an empty list.
#[must_use]
pub fn resolve_phase(catalog: &Catalog, phase: usize, progress: &ProgressMap) -> Vec<ResolvedTask> {
    let Some(def) = catalog.phase(phase) else {
        return Vec::new();
    };

    def.tasks
        .iter()
        .filter_map(|task| {
            let slot = catalog.slot(&task.id)?;
            Some(ResolvedTask {
                id: task.id.clone(),
                status: resolve_slot(catalog, slot, progress),
                mandatory: task.mandatory(),
            })
        })
        .collect()
}

fn resolve_slot(catalog: &Catalog, slot: TaskSlot, progress: &ProgressMap) -> Status {
    let tasks = &catalog.phases()[slot.phase].tasks;
    let task = &tasks[slot.position];

    if let Some(record) = progress.get(&task.id) {
        return record.status;
    }
    if task.optional || slot.position == 0 {
        return Status::Active;
    }

    match slot.prev_mandatory {
        None => Status::Active,
        Some(prev) if progress.is_completed(&tasks[prev].id) => Status::Active,
        Some(_) => Status::Blocked,
    }
}
