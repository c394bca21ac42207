//! Progress records
//!
//! A record exists for every task the user has touched. Records are created
//! lazily, overwritten field by field, and never removed.

use roadmap_catalog::{Status, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque reference to an uploaded document in the blob store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    /// Wrap a raw reference
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw reference
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted per-task state
///
/// Serialises as `{"status": ..., "notes"?: ..., "uploadedFile"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Authoritative status once the record exists
    pub status: Status,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Uploaded evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_file: Option<FileRef>,
}

impl ProgressRecord {
    /// Record with only a status
    #[inline]
    #[must_use]
    pub fn new(status: Status) -> Self {
        Self {
            status,
            notes: None,
            uploaded_file: None,
        }
    }
}

/// Partial update to a record
///
/// Supplied fields overwrite, omitted fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    /// New status
    pub status: Option<Status>,
    /// New notes
    pub notes: Option<String>,
    /// New document reference
    pub uploaded_file: Option<FileRef>,
}

impl ProgressPatch {
    /// Status-only patch
    #[inline]
    #[must_use]
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Notes-only patch
    #[inline]
    #[must_use]
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::default()
        }
    }

    /// Document-only patch
    #[inline]
    #[must_use]
    pub fn file(file: FileRef) -> Self {
        Self {
            uploaded_file: Some(file),
            ..Self::default()
        }
    }

    /// Merge onto an existing record, or start a new `active` one
    #[inline]
    #[must_use]
    pub fn merge(&self, existing: Option<&ProgressRecord>) -> ProgressRecord {
        self.merge_or(existing, Status::Active)
    }

    /// Merge onto an existing record, or start a new one at `initial`
    ///
    /// `initial` only applies when the patch carries no status and there is
    /// no record yet. Callers pass the task's resolved status so that editing
    /// notes or files never moves a task along the unlock chain.
    #[must_use]
    pub fn merge_or(&self, existing: Option<&ProgressRecord>, initial: Status) -> ProgressRecord {
        let status = self
            .status
            .or_else(|| existing.map(|r| r.status))
            .unwrap_or(initial);
        ProgressRecord {
            status,
            notes: self
                .notes
                .clone()
                .or_else(|| existing.and_then(|r| r.notes.clone())),
            uploaded_file: self
                .uploaded_file
                .clone()
                .or_else(|| existing.and_then(|r| r.uploaded_file.clone())),
        }
    }
}

/// All progress records of one user, keyed by task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap(BTreeMap<TaskId, ProgressRecord>);

impl ProgressMap {
    /// Empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a task, if touched
    #[inline]
    #[must_use]
    pub fn get(&self, task: &TaskId) -> Option<&ProgressRecord> {
        self.0.get(task)
    }

    /// Persisted status of a task, if touched
    #[inline]
    #[must_use]
    pub fn status_of(&self, task: &TaskId) -> Option<Status> {
        self.0.get(task).map(|r| r.status)
    }

    /// Whether the persisted status is `completed`
    #[inline]
    #[must_use]
    pub fn is_completed(&self, task: &TaskId) -> bool {
        self.status_of(task).is_some_and(Status::is_completed)
    }

    /// Apply a patch, creating the record if needed; returns the new record
    pub fn apply(&mut self, task: &TaskId, patch: &ProgressPatch) -> ProgressRecord {
        self.apply_or(task, patch, Status::Active)
    }

    /// Like [`apply`](Self::apply), seeding a new record's status with `initial`
    pub fn apply_or(
        &mut self,
        task: &TaskId,
        patch: &ProgressPatch,
        initial: Status,
    ) -> ProgressRecord {
        let record = patch.merge_or(self.0.get(task), initial);
        self.0.insert(task.clone(), record.clone());
        record
    }

    /// Overwrite a record
    #[inline]
    pub fn insert(&mut self, task: TaskId, record: ProgressRecord) {
        self.0.insert(task, record);
    }

    /// Copy every record of `other` over this map; `other` wins on conflict
    pub fn overlay(&mut self, other: &ProgressMap) {
        for (task, record) in &other.0 {
            self.0.insert(task.clone(), record.clone());
        }
    }

    /// Iterate records in task-id order
    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &ProgressRecord)> {
        self.0.iter()
    }

    /// Number of touched tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No task touched yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TaskId, ProgressRecord)> for ProgressMap {
    fn from_iter<I: IntoIterator<Item = (TaskId, ProgressRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
