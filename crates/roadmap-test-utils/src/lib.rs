//! Testing utilities for the roadmap workspace
//!
//! Small fixture catalogs, a record store with injectable failures, and a
//! helper that wires a tracker to in-memory collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roadmap_catalog::{Catalog, PhaseDef, TaskDef, TaskId};
use roadmap_core::Tracker;
use roadmap_store::{
    MemoryBlobStore, MemoryCache, MemoryRecordStore, RecordStore, StoreError, StoreResult,
    StoredRecord, UserId,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One phase: mandatory `A`, optional `B`, mandatory `C`
pub fn abc_catalog() -> Catalog {
    Catalog::new(vec![PhaseDef::new("p", "Phase")
        .with_task(TaskDef::basic("A", "Task A"))
        .with_task(TaskDef::optional("B", "Task B"))
        .with_task(TaskDef::basic("C", "Task C"))])
    .unwrap()
}

/// Two phases: `a1`, `x1` (optional), `a2` then `b1`, `b2`
pub fn two_phase_catalog() -> Catalog {
    Catalog::new(vec![
        PhaseDef::new("first", "First")
            .with_task(TaskDef::basic("a1", "A1"))
            .with_task(TaskDef::optional("x1", "X1"))
            .with_task(TaskDef::basic("a2", "A2")),
        PhaseDef::new("second", "Second")
            .with_task(TaskDef::basic("b1", "B1"))
            .with_task(TaskDef::basic("b2", "B2")),
    ])
    .unwrap()
}

/// Record store that fails on demand
///
/// Upserts for tasks in the failure set are rejected; `set_offline(true)`
/// makes every call fail as unavailable.
#[derive(Debug, Default)]
pub struct FlakyRecordStore {
    inner: MemoryRecordStore,
    failing: Mutex<HashSet<TaskId>>,
    offline: AtomicBool,
    upserts: AtomicUsize,
}

impl FlakyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_task(&self, task: &str) {
        self.failing.lock().insert(TaskId::new(task));
    }

    pub fn heal_task(&self, task: &str) {
        self.failing.lock().remove(&TaskId::new(task));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Successful upserts so far
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryRecordStore {
        &self.inner
    }

    /// Write straight to the backing store, bypassing failure injection
    pub async fn seed(&self, record: StoredRecord) {
        self.inner.upsert(record).await.unwrap();
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn read_all(&self, user: &UserId) -> StoreResult<Vec<StoredRecord>> {
        self.check_online()?;
        self.inner.read_all(user).await
    }

    async fn upsert(&self, record: StoredRecord) -> StoreResult<()> {
        self.check_online()?;
        if self.failing.lock().contains(&record.task_id) {
            return Err(StoreError::Rejected {
                task_id: record.task_id,
                reason: "injected failure".into(),
            });
        }
        self.inner.upsert(record).await?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Tracker wired to in-memory collaborators, with handles to each
pub struct Harness {
    pub tracker: Arc<Tracker>,
    pub records: Arc<FlakyRecordStore>,
    pub cache: Arc<MemoryCache>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl Harness {
    pub fn new(catalog: Catalog) -> Self {
        let records = Arc::new(FlakyRecordStore::new());
        let cache = Arc::new(MemoryCache::new());
        let blobs = Arc::new(MemoryBlobStore::default());
        let tracker = Arc::new(Tracker::new(
            Arc::new(catalog),
            records.clone(),
            cache.clone(),
            blobs.clone(),
        ));
        Self {
            tracker,
            records,
            cache,
            blobs,
        }
    }

    /// Same collaborators, fresh tracker state, as after a restart
    pub fn restart(&self) -> Arc<Tracker> {
        Arc::new(Tracker::new(
            Arc::new(self.tracker.catalog().clone()),
            self.records.clone(),
            self.cache.clone(),
            self.blobs.clone(),
        ))
    }
}

pub fn abc_harness() -> Harness {
    Harness::new(abc_catalog())
}
