//! Roadmap Progress
//!
//! The pure core of the tracker: everything here takes the catalog and the
//! progress map as explicit arguments and performs no I/O.
//!
//! - [`resolve`] / [`resolve_phase`]: effective status of tasks
//! - [`next_unlock`]: which task to activate after a completion
//! - [`phase_progress`], [`overall_progress`], [`optional_progress`],
//!   [`find_current_phase`]: completion metrics
//!
//! # Example
//!
//! ```rust
//! use roadmap_catalog::{Catalog, PhaseDef, Status, TaskDef};
//! use roadmap_progress::{resolve, ProgressMap, ProgressPatch};
//!
//! let catalog = Catalog::new(vec![PhaseDef::new("p", "P")
//!     .with_task(TaskDef::basic("a", "A"))
//!     .with_task(TaskDef::basic("b", "B"))])
//! .unwrap();
//!
//! let mut progress = ProgressMap::new();
//! assert_eq!(resolve(&catalog, &"b".into(), &progress), Some(Status::Blocked));
//!
//! progress.apply(&"a".into(), &ProgressPatch::status(Status::Completed));
//! assert_eq!(resolve(&catalog, &"b".into(), &progress), Some(Status::Active));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregate;
mod record;
mod resolve;
mod unlock;

pub use aggregate::{
    find_current_phase, is_all_complete, is_phase_unlocked, optional_phase_progress,
    optional_progress, overall_progress, phase_progress, summarize, Completion, Summary,
};
pub use record::{FileRef, ProgressMap, ProgressPatch, ProgressRecord};
pub use resolve::{resolve, resolve_phase, ResolvedTask};
pub use unlock::next_unlock;

pub use roadmap_catalog::{Status, TaskId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
