//! Identity and record types shared by the collaborators

use chrono::{DateTime, Utc};
use roadmap_catalog::TaskId;
use roadmap_progress::ProgressRecord;
use serde::{Deserialize, Serialize};

/// Stable user identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user
    pub user_id: UserId,
    /// Contact address, when the provider shares it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    /// Session for a user without extra profile data
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: None,
        }
    }
}

/// Row in the remote record store, unique per `(user_id, task_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Owner
    pub user_id: UserId,
    /// Task
    pub task_id: TaskId,
    /// Progress payload
    #[serde(flatten)]
    pub record: ProgressRecord,
    /// When the task was first stored as completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Stamp a progress record for storage
    #[must_use]
    pub fn new(user_id: UserId, task_id: TaskId, record: ProgressRecord, now: DateTime<Utc>) -> Self {
        let completed_at = record.status.is_completed().then_some(now);
        Self {
            user_id,
            task_id,
            record,
            completed_at,
            updated_at: now,
        }
    }

    /// Keep the original completion time when a completed task is rewritten
    pub(crate) fn carry_completion(&mut self, previous: Option<&StoredRecord>) {
        if !self.record.status.is_completed() {
            self.completed_at = None;
            return;
        }
        if let Some(earlier) = previous.and_then(|p| p.completed_at) {
            self.completed_at = Some(earlier);
        }
    }
}
