//! Remote record store
//!
//! Upsert-only persistence keyed by `(user_id, task_id)`. Two backends:
//! [`MemoryRecordStore`] for tests and embedding, and [`FileRecordStore`]
//! which keeps one JSON document per user in a directory.

use crate::error::{StoreError, StoreResult};
use crate::types::{StoredRecord, UserId};
use async_trait::async_trait;
use dashmap::DashMap;
use roadmap_catalog::TaskId;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Durable per-user progress storage
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Every record stored for a user
    async fn read_all(&self, user: &UserId) -> StoreResult<Vec<StoredRecord>>;

    /// Insert or overwrite the record for `(record.user_id, record.task_id)`
    async fn upsert(&self, record: StoredRecord) -> StoreResult<()>;
}

/// In-process record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: DashMap<(UserId, TaskId), StoredRecord>,
}

impl MemoryRecordStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all users
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Direct row lookup
    #[must_use]
    pub fn get(&self, user: &UserId, task: &TaskId) -> Option<StoredRecord> {
        self.rows
            .get(&(user.clone(), task.clone()))
            .map(|r| r.value().clone())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read_all(&self, user: &UserId) -> StoreResult<Vec<StoredRecord>> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|entry| &entry.key().0 == user)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        Ok(rows)
    }

    async fn upsert(&self, mut record: StoredRecord) -> StoreResult<()> {
        let key = (record.user_id.clone(), record.task_id.clone());
        let previous = self.rows.get(&key).map(|r| r.value().clone());
        record.carry_completion(previous.as_ref());
        self.rows.insert(key, record);
        Ok(())
    }
}

/// Directory-backed record store, one JSON document per user
#[derive(Debug)]
pub struct FileRecordStore {
    root: PathBuf,
    // serialises read-modify-write cycles on user documents
    write_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Store rooted at `root`; the directory is created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// User ids are hashed so any identifier maps to a safe file name
    fn user_path(&self, user: &UserId) -> PathBuf {
        let digest = Sha256::digest(user.as_str().as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read_document(&self, user: &UserId) -> StoreResult<BTreeMap<TaskId, StoredRecord>> {
        match tokio::fs::read(self.user_path(user)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn read_all(&self, user: &UserId) -> StoreResult<Vec<StoredRecord>> {
        Ok(self.read_document(user).await?.into_values().collect())
    }

    async fn upsert(&self, mut record: StoredRecord) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.read_document(&record.user_id).await?;
        record.carry_completion(doc.get(&record.task_id));
        let path = self.user_path(&record.user_id);
        doc.insert(record.task_id.clone(), record);

        tokio::fs::create_dir_all(&self.root).await?;
        write_atomic(&path, &serde_json::to_vec_pretty(&doc)?).await?;
        tracing::debug!(path = %path.display(), rows = doc.len(), "record document written");
        Ok(())
    }
}

/// Write through a sibling temp file and rename over the target
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use roadmap_catalog::Status;
    use roadmap_progress::ProgressRecord;

    fn row(user: &str, task: &str, status: Status) -> StoredRecord {
        StoredRecord::new(
            UserId::new(user),
            TaskId::new(task),
            ProgressRecord::new(status),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn memory_upsert_is_keyed_by_user_and_task() {
        let store = MemoryRecordStore::new();
        store.upsert(row("u1", "a", Status::Active)).await.unwrap();
        store.upsert(row("u1", "a", Status::Completed)).await.unwrap();
        store.upsert(row("u2", "a", Status::Active)).await.unwrap();

        assert_eq!(store.len(), 2);
        let rows = store.read_all(&UserId::new("u1")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.status, Status::Completed);
    }

    #[tokio::test]
    async fn completion_time_survives_rewrites() {
        let store = MemoryRecordStore::new();
        let mut first = row("u", "a", Status::Completed);
        let original = Utc::now() - Duration::days(3);
        first.completed_at = Some(original);
        store.upsert(first).await.unwrap();

        let mut second = row("u", "a", Status::Completed);
        second.record.notes = Some("more".into());
        store.upsert(second).await.unwrap();

        let stored = store.get(&UserId::new("u"), &TaskId::new("a")).unwrap();
        assert_eq!(stored.completed_at, Some(original));
        assert_eq!(stored.record.notes.as_deref(), Some("more"));

        store.upsert(row("u", "a", Status::Active)).await.unwrap();
        let stored = store.get(&UserId::new("u"), &TaskId::new("a")).unwrap();
        assert_eq!(stored.completed_at, None);
    }
}
