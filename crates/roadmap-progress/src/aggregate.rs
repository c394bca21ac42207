//! Completion metrics
//!
//! Headline numbers count mandatory tasks only. Optional tasks get their own
//! parallel counters with the same shape. A task counts as done when its
//! persisted status is `completed`; derived statuses never reach
//! `completed`, so no resolution is needed here.
//!
//! A group with no tasks reports `percent = 0.0` and is treated as
//! vacuously complete.

use crate::record::ProgressMap;
use roadmap_catalog::{Catalog, PhaseDef, TaskDef};
use serde::Serialize;

/// Completed/total counters for a group of tasks
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completion {
    /// Completed tasks
    pub completed: usize,
    /// Tasks in the group
    pub total: usize,
    /// `completed / total * 100`, or `0.0` for an empty group
    pub percent: f64,
    /// All tasks completed (true for an empty group)
    pub is_complete: bool,
}

impl Completion {
    /// Build from raw counts
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64) * 100.0
        };
        Self {
            completed,
            total,
            percent,
            is_complete: completed == total,
        }
    }

    /// Rounded percentage for display
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percent(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }

    fn add(self, other: Self) -> Self {
        Self::from_counts(self.completed + other.completed, self.total + other.total)
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::from_counts(0, 0)
    }
}

/// Roll-up of the whole catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Mandatory tasks
    pub overall: Completion,
    /// Optional tasks
    pub optional: Completion,
    /// First phase with unfinished mandatory work, `None` when all done
    pub current_phase: Option<usize>,
}

fn count(phase: &PhaseDef, progress: &ProgressMap, include: fn(&TaskDef) -> bool) -> Completion {
    let (completed, total) = phase
        .tasks
        .iter()
        .filter(|t| include(t))
        .fold((0, 0), |(done, total), t| {
            (done + usize::from(progress.is_completed(&t.id)), total + 1)
        });
    Completion::from_counts(completed, total)
}

/// Mandatory completion of one phase
#[must_use]
pub fn phase_progress(phase: &PhaseDef, progress: &ProgressMap) -> Completion {
    count(phase, progress, TaskDef::mandatory)
}

/// Optional completion of one phase
#[must_use]
pub fn optional_phase_progress(phase: &PhaseDef, progress: &ProgressMap) -> Completion {
    count(phase, progress, |t| t.optional)
}

/// Mandatory completion summed across all phases
#[must_use]
pub fn overall_progress(catalog: &Catalog, progress: &ProgressMap) -> Completion {
    catalog
        .phases()
        .iter()
        .map(|p| phase_progress(p, progress))
        .fold(Completion::default(), Completion::add)
}

/// Optional completion summed across all phases
#[must_use]
pub fn optional_progress(catalog: &Catalog, progress: &ProgressMap) -> Completion {
    catalog
        .phases()
        .iter()
        .map(|p| optional_phase_progress(p, progress))
        .fold(Completion::default(), Completion::add)
}

/// Index of the first phase with a mandatory task not yet completed
#[must_use]
pub fn find_current_phase(catalog: &Catalog, progress: &ProgressMap) -> Option<usize> {
    catalog
        .phases()
        .iter()
        .position(|p| !phase_progress(p, progress).is_complete)
}

/// Every mandatory task in every phase is completed
#[inline]
#[must_use]
pub fn is_all_complete(catalog: &Catalog, progress: &ProgressMap) -> bool {
    find_current_phase(catalog, progress).is_none()
}

/// A phase is open when it is the first one or the phase right before it
/// has all mandatory work done
///
/// Out-of-range indices are never unlocked.
#[must_use]
pub fn is_phase_unlocked(catalog: &Catalog, index: usize, progress: &ProgressMap) -> bool {
    match index {
        0 => !catalog.phases().is_empty(),
        i if i < catalog.len() => phase_progress(&catalog.phases()[i - 1], progress).is_complete,
        _ => false,
    }
}

/// Overall, optional and current-phase figures in one pass
#[must_use]
pub fn summarize(catalog: &Catalog, progress: &ProgressMap) -> Summary {
    Summary {
        overall: overall_progress(catalog, progress),
        optional: optional_progress(catalog, progress),
        current_phase: find_current_phase(catalog, progress),
    }
}
