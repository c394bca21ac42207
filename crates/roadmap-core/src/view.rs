//! Read model of the whole roadmap
//!
//! A snapshot joining catalog definitions with resolved statuses and
//! counters, ready to render or serialise.

use roadmap_catalog::{Catalog, PhaseId, Priority, Status, TaskId};
use roadmap_progress::{
    is_phase_unlocked, optional_phase_progress, phase_progress, resolve_phase, summarize,
    Completion, FileRef, ProgressMap,
};
use serde::Serialize;

/// One task with its effective status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    /// Task identifier
    pub id: TaskId,
    /// Display title
    pub title: String,
    /// Optional tasks never gate progression
    pub optional: bool,
    /// Effective status
    pub status: Status,
    /// Priority hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Effort estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    /// Notes entered by the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Uploaded document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_file: Option<FileRef>,
    /// Label of the document the task asks for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_required: Option<String>,
}

/// One phase with counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseView {
    /// Phase identifier
    pub id: PhaseId,
    /// Display title
    pub title: String,
    /// First phase, or every earlier phase has its mandatory work done
    pub unlocked: bool,
    /// Mandatory counters
    pub mandatory: Completion,
    /// Optional counters
    pub optional: Completion,
    /// Tasks in catalog order
    pub tasks: Vec<TaskView>,
}

/// Whole roadmap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapView {
    /// Phases in catalog order
    pub phases: Vec<PhaseView>,
    /// Mandatory counters over all phases
    pub overall: Completion,
    /// Optional counters over all phases
    pub optional: Completion,
    /// First phase with unfinished mandatory work
    pub current_phase: Option<PhaseId>,
    /// Every mandatory task completed
    pub all_complete: bool,
}

impl RoadmapView {
    /// Snapshot of `catalog` under `progress`
    #[must_use]
    pub fn build(catalog: &Catalog, progress: &ProgressMap) -> Self {
        let phases = catalog
            .phases()
            .iter()
            .enumerate()
            .map(|(index, phase)| {
                let tasks = resolve_phase(catalog, index, progress)
                    .into_iter()
                    .zip(&phase.tasks)
                    .map(|(resolved, def)| {
                        let record = progress.get(&resolved.id);
                        TaskView {
                            id: resolved.id,
                            title: def.title.clone(),
                            optional: def.optional,
                            status: resolved.status,
                            priority: def.priority,
                            estimated_time: def.estimated_time.clone(),
                            notes: record.and_then(|r| r.notes.clone()),
                            uploaded_file: record.and_then(|r| r.uploaded_file.clone()),
                            file_required: def.file_required.clone(),
                        }
                    })
                    .collect();
                PhaseView {
                    id: phase.id.clone(),
                    title: phase.title.clone(),
                    unlocked: is_phase_unlocked(catalog, index, progress),
                    mandatory: phase_progress(phase, progress),
                    optional: optional_phase_progress(phase, progress),
                    tasks,
                }
            })
            .collect();

        let summary = summarize(catalog, progress);
        Self {
            phases,
            overall: summary.overall,
            optional: summary.optional,
            current_phase: summary
                .current_phase
                .and_then(|i| catalog.phase(i))
                .map(|p| p.id.clone()),
            all_complete: summary.current_phase.is_none(),
        }
    }

    /// Task by identifier
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&TaskView> {
        self.phases
            .iter()
            .flat_map(|p| p.tasks.iter())
            .find(|t| &t.id == id)
    }

    /// Phase currently being worked on
    #[must_use]
    pub fn current(&self) -> Option<&PhaseView> {
        let current = self.current_phase.as_ref()?;
        self.phases.iter().find(|p| &p.id == current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_catalog::{PhaseDef, TaskDef};
    use roadmap_progress::ProgressPatch;

    #[test]
    fn view_reflects_resolution_and_records() {
        let catalog = Catalog::new(vec![
            PhaseDef::new("one", "One")
                .with_task(TaskDef::basic("a", "A"))
                .with_task(TaskDef::optional("x", "X")),
            PhaseDef::new("two", "Two").with_task(TaskDef::basic("b", "B")),
        ])
        .unwrap();

        let mut progress = ProgressMap::new();
        progress.apply(&"x".into(), &ProgressPatch::notes("maybe later"));
        let view = RoadmapView::build(&catalog, &progress);

        assert_eq!(view.current_phase, Some(PhaseId::new("one")));
        assert!(view.phases[0].unlocked);
        assert!(!view.phases[1].unlocked);
        assert_eq!(view.task(&"x".into()).unwrap().notes.as_deref(), Some("maybe later"));
        assert_eq!(view.task(&"b".into()).unwrap().status, Status::Active);
        assert!(!view.all_complete);

        progress.apply(&"a".into(), &ProgressPatch::status(Status::Completed));
        let view = RoadmapView::build(&catalog, &progress);
        assert_eq!(view.current().map(|p| p.id.as_str()), Some("two"));
        assert!(view.phases[1].unlocked);
        assert_eq!(view.phases[0].mandatory.percent, 100.0);
    }
}
