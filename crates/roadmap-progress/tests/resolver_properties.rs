use proptest::prelude::*;
use roadmap_catalog::{Catalog, PhaseDef, Status, TaskDef, TaskId};
use roadmap_progress::{
    overall_progress, optional_progress, phase_progress, resolve, summarize, ProgressMap,
    ProgressRecord,
};

/// Catalog from per-phase optional flags; task ids are `p{phase}t{position}`
fn build_catalog(layout: &[Vec<bool>]) -> Catalog {
    let phases = layout
        .iter()
        .enumerate()
        .map(|(p, flags)| {
            flags.iter().enumerate().fold(
                PhaseDef::new(format!("p{p}"), format!("Phase {p}")),
                |phase, (t, optional)| {
                    let id = format!("p{p}t{t}");
                    phase.with_task(if *optional {
                        TaskDef::optional(id.clone(), id)
                    } else {
                        TaskDef::basic(id.clone(), id)
                    })
                },
            )
        })
        .collect();
    Catalog::new(phases).unwrap()
}

/// Assign a record (or none) to each task in catalog order.
/// Optional tasks are only ever touched as active or completed.
fn build_progress(catalog: &Catalog, picks: &[u8]) -> ProgressMap {
    catalog
        .tasks()
        .zip(picks.iter().cycle())
        .filter_map(|(task, pick)| {
            let status = match (pick % 4, task.optional) {
                (0, _) => return None,
                (1, false) => Status::Blocked,
                (1, true) | (2, _) => Status::Active,
                _ => Status::Completed,
            };
            Some((task.id.clone(), ProgressRecord::new(status)))
        })
        .collect()
}

fn layout_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 0..7), 1..5)
}

proptest! {
    #[test]
    fn prop_record_overrides_derivation(
        layout in layout_strategy(),
        picks in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let catalog = build_catalog(&layout);
        let progress = build_progress(&catalog, &picks);

        for task in catalog.tasks() {
            if let Some(record) = progress.get(&task.id) {
                prop_assert_eq!(resolve(&catalog, &task.id, &progress), Some(record.status));
            }
        }
    }

    #[test]
    fn prop_optional_never_blocked(
        layout in layout_strategy(),
        picks in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let catalog = build_catalog(&layout);
        let progress = build_progress(&catalog, &picks);

        for task in catalog.tasks().filter(|t| t.optional) {
            prop_assert_ne!(resolve(&catalog, &task.id, &progress), Some(Status::Blocked));
        }
    }

    #[test]
    fn prop_linear_chain_without_optional(
        len in 1..8usize,
        picks in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let catalog = build_catalog(&[vec![false; len]]);
        let progress = build_progress(&catalog, &picks);
        let tasks = &catalog.phases()[0].tasks;

        for i in 1..tasks.len() {
            if progress.get(&tasks[i].id).is_some() {
                continue;
            }
            let active = resolve(&catalog, &tasks[i].id, &progress) == Some(Status::Active);
            prop_assert_eq!(active, progress.is_completed(&tasks[i - 1].id));
        }
    }

    #[test]
    fn prop_overall_ignores_optional(
        layout in layout_strategy(),
        picks in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let catalog = build_catalog(&layout);
        let progress = build_progress(&catalog, &picks);

        let overall = overall_progress(&catalog, &progress);
        prop_assert_eq!(overall.total, catalog.mandatory_count());
        let expected_done = catalog
            .tasks()
            .filter(|t| t.mandatory() && progress.is_completed(&t.id))
            .count();
        prop_assert_eq!(overall.completed, expected_done);

        let optional = optional_progress(&catalog, &progress);
        prop_assert_eq!(optional.total, catalog.optional_count());
    }

    #[test]
    fn prop_percent_bounded(
        layout in layout_strategy(),
        picks in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let catalog = build_catalog(&layout);
        let progress = build_progress(&catalog, &picks);

        for phase in catalog.phases() {
            let c = phase_progress(phase, &progress);
            prop_assert!(!c.percent.is_nan());
            prop_assert!((0.0..=100.0).contains(&c.percent));
            if c.total == 0 {
                prop_assert_eq!(c.percent, 0.0);
            }
        }
    }

    #[test]
    fn prop_pure_functions_are_idempotent(
        layout in layout_strategy(),
        picks in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let catalog = build_catalog(&layout);
        let progress = build_progress(&catalog, &picks);

        let first: Vec<_> = catalog.tasks().map(|t| resolve(&catalog, &t.id, &progress)).collect();
        let second: Vec<_> = catalog.tasks().map(|t| resolve(&catalog, &t.id, &progress)).collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(summarize(&catalog, &progress), summarize(&catalog, &progress));
    }
}

#[test]
fn unknown_ids_in_progress_are_ignored() {
    let catalog = build_catalog(&[vec![false, false]]);
    let mut progress = ProgressMap::new();
    progress.insert(TaskId::new("stale-task"), ProgressRecord::new(Status::Completed));

    let overall = overall_progress(&catalog, &progress);
    assert_eq!((overall.completed, overall.total), (0, 2));
}
