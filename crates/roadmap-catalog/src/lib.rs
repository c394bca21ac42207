//! Roadmap Catalog
//!
//! Static phase and task definitions for a multi-phase checklist.
//!
//! - [`PhaseDef`] / [`TaskDef`]: plain definitions, loadable from TOML
//! - [`Catalog`]: validated, immutable, with a precomputed mandatory-neighbour
//!   index per task ([`TaskSlot`])
//! - Task templates: [`TaskDef::basic`], [`TaskDef::critical`],
//!   [`TaskDef::optional`] and friends
//!
//! # Example
//!
//! ```rust
//! use roadmap_catalog::{Catalog, PhaseDef, TaskDef};
//!
//! let phase = PhaseDef::new("prep", "Preparation")
//!     .with_task(TaskDef::critical("passport", "Renew passport"))
//!     .with_task(TaskDef::optional("course", "Language course"))
//!     .with_task(TaskDef::basic("budget", "Plan budget"));
//!
//! let catalog = Catalog::new(vec![phase]).unwrap();
//! let slot = catalog.slot(&"budget".into()).unwrap();
//! assert_eq!(slot.prev_mandatory, Some(0));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builtin;
mod catalog;
mod error;
mod templates;
mod types;

pub use catalog::{Catalog, CatalogDocument, TaskSlot};
pub use error::CatalogError;
pub use templates::{DEFAULT_ESTIMATE, DEFAULT_FILE_LABEL};
pub use types::{PhaseDef, PhaseId, Priority, Status, TaskDef, TaskId, TaskLink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
