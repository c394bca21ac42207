//! Roadmap Store
//!
//! The external collaborators of the tracker, each behind an async trait so
//! the application state never depends on a concrete backend.
//!
//! - [`RecordStore`]: remote per-user progress, upsert keyed by `(user, task)`
//! - [`LocalCache`]: device-local key-value store; [`PROGRESS_KEY`] holds the
//!   full progress map
//! - [`BlobStore`]: uploaded documents behind signed, time-limited links
//! - [`IdentityProvider`]: current session and sign-in/sign-out transitions
//!
//! # Example
//!
//! ```rust
//! use roadmap_store::{load_progress, save_progress, MemoryCache};
//! use roadmap_progress::{ProgressMap, ProgressPatch, Status};
//!
//! # tokio_test_block(async {
//! let cache = MemoryCache::new();
//! let mut progress = ProgressMap::new();
//! progress.apply(&"visa".into(), &ProgressPatch::status(Status::Completed));
//!
//! save_progress(&cache, &progress).await.unwrap();
//! assert_eq!(load_progress(&cache).await.unwrap(), progress);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod blob;
mod cache;
mod error;
mod identity;
mod record_store;
mod types;

pub use blob::{
    BlobStore, LinkSigner, LocalBlobStore, MemoryBlobStore, SignedLink, DEFAULT_LINK_VALIDITY,
};
pub use cache::{
    load_json, load_progress, save_progress, store_json, FileCache, LocalCache, MemoryCache,
    DEADLINE_KEY, PROGRESS_KEY, SESSION_KEY,
};
pub use error::{StoreError, StoreResult};
pub use identity::{IdentityProvider, StaticIdentity};
pub use record_store::{FileRecordStore, MemoryRecordStore, RecordStore};
pub use types::{Session, StoredRecord, UserId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
