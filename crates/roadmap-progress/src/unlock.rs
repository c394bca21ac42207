//! Unlock planning
//!
//! Decides which task, if any, must be written `active` after a task is
//! completed. Only the next mandatory task in the same phase is ever
//! unlocked; moving on to the next phase is derived from phase completion
//! and never stored.

use crate::record::ProgressMap;
use roadmap_catalog::{Catalog, TaskId};

/// Task to activate after `completed` was marked completed
///
/// `None` when the task is unknown or optional, when it is the last
/// mandatory task of its phase, or when the follower is already completed.
#[must_use]
pub fn next_unlock(catalog: &Catalog, completed: &TaskId, progress: &ProgressMap) -> Option<TaskId> {
    let slot = catalog.slot(completed)?;
    let task = catalog.task_at(slot.phase, slot.position)?;
    if task.optional {
        return None;
    }

    let next = catalog.task_at(slot.phase, slot.next_mandatory?)?;
    if progress.is_completed(&next.id) {
        return None;
    }
    Some(next.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProgressRecord;
    use roadmap_catalog::{PhaseDef, Status, TaskDef};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            PhaseDef::new("p1", "P1")
                .with_task(TaskDef::basic("a", "A"))
                .with_task(TaskDef::optional("b", "B"))
                .with_task(TaskDef::basic("c", "C")),
            PhaseDef::new("p2", "P2").with_task(TaskDef::basic("d", "D")),
        ])
        .unwrap()
    }

    #[test]
    fn skips_optional_to_next_mandatory() {
        let next = next_unlock(&catalog(), &"a".into(), &ProgressMap::new());
        assert_eq!(next, Some(TaskId::new("c")));
    }

    #[test]
    fn optional_unlocks_nothing() {
        assert_eq!(next_unlock(&catalog(), &"b".into(), &ProgressMap::new()), None);
    }

    #[test]
    fn does_not_cross_phases() {
        assert_eq!(next_unlock(&catalog(), &"c".into(), &ProgressMap::new()), None);
    }

    #[test]
    fn leaves_completed_follower_alone() {
        let mut progress = ProgressMap::new();
        progress.insert("c".into(), ProgressRecord::new(Status::Completed));
        assert_eq!(next_unlock(&catalog(), &"a".into(), &progress), None);
    }
}
