//! Roadmap Core
//!
//! Application state for a phase/task checklist: the [`Tracker`] keeps the
//! progress map, applies updates optimistically through the local cache,
//! propagates unlocks when a task is completed, and reconciles local and
//! remote progress when the user signs in.
//!
//! Also here: [`NotesDebouncer`] for bursty note edits, [`Deadline`] for the
//! target move date, [`TrackerConfig`], and the [`RoadmapView`] read model.
//!
//! # Example
//!
//! ```rust
//! use roadmap_core::Tracker;
//! use roadmap_catalog::{Catalog, PhaseDef, Status, TaskDef, TaskId};
//! use roadmap_store::{MemoryBlobStore, MemoryCache, MemoryRecordStore};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let catalog = Catalog::new(vec![PhaseDef::new("p", "P")
//!     .with_task(TaskDef::basic("a", "A"))
//!     .with_task(TaskDef::basic("b", "B"))])
//! .unwrap();
//!
//! let tracker = Tracker::new(
//!     Arc::new(catalog),
//!     Arc::new(MemoryRecordStore::new()),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(MemoryBlobStore::default()),
//! );
//!
//! let outcome = tracker.complete_task(&"a".into()).await.unwrap();
//! assert_eq!(outcome.unlocked.map(|u| u.task_id), Some(TaskId::new("b")));
//! assert_eq!(tracker.status(&"b".into()).await.unwrap(), Status::Active);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod deadline;
mod debounce;
mod error;
mod tracker;
mod view;

pub use config::{TrackerConfig, ENV_PREFIX};
pub use deadline::{Deadline, Urgency};
pub use debounce::NotesDebouncer;
pub use error::{TrackerError, TrackerResult};
pub use tracker::{CompletionOutcome, RemoteWrite, SyncReport, Tracker, UpdateOutcome};
pub use view::{PhaseView, RoadmapView, TaskView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
