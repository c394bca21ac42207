//! Core catalog types
//!
//! Static definitions only. Nothing in here changes after the catalog is
//! loaded; per-user state lives in progress records.

use serde::{Deserialize, Serialize};

/// Stable task identifier, unique across the whole catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a task ID from any string-like value
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

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Stable phase identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseId(pub String);

impl PhaseId {
    /// Create a phase ID from any string-like value
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

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Task status, shared by static defaults and persisted progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Waiting on an earlier mandatory task
    #[default]
    Blocked,
    /// Available to work on
    Active,
    /// Done
    Completed,
}

impl Status {
    /// Wire name used by the persistence schema
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Blocked => "blocked",
            Status::Active => "active",
            Status::Completed => "completed",
        }
    }

    /// Check for the completed state
    #[inline]
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocked" => Ok(Status::Blocked),
            "active" => Ok(Status::Active),
            "completed" => Ok(Status::Completed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice to have
    Low,
    /// Regular task
    Medium,
    /// Important
    High,
    /// Must not slip
    Critical,
}

impl Priority {
    /// Whether the priority is worth highlighting on an unfinished task
    #[inline]
    #[must_use]
    pub fn is_urgent(self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

/// External reference attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    /// Link label
    pub title: String,
    /// Target URL
    pub url: String,
    /// Short explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Static task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDef {
    /// Unique identifier
    pub id: TaskId,
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Optional tasks never block and are excluded from headline metrics
    #[serde(default)]
    pub optional: bool,
    /// Status used only when no progress record exists
    #[serde(default, rename = "status")]
    pub default_status: Status,
    /// Priority hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Human-readable effort estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    /// Useful references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<TaskLink>,
    /// Practical advice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    /// What happens if the task is skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<String>,
    /// Document expected as evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_required: Option<String>,
    /// Why the task is optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_reason: Option<String>,
}

impl TaskDef {
    /// Mandatory tasks count toward completion and form the unlock chain
    #[inline]
    #[must_use]
    pub fn mandatory(&self) -> bool {
        !self.optional
    }
}

/// Static phase definition: an ordered list of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDef {
    /// Unique identifier
    pub id: PhaseId,
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Human-readable duration estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
    /// Tasks in sequencing order
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

impl PhaseDef {
    /// Create an empty phase
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: PhaseId::new(id),
            title: title.into(),
            description: String::new(),
            estimated_duration: None,
            tasks: Vec::new(),
        }
    }

    /// Append a task
    #[must_use]
    pub fn with_task(mut self, task: TaskDef) -> Self {
        self.tasks.push(task);
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Number of mandatory tasks
    #[must_use]
    pub fn mandatory_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.mandatory()).count()
    }

    /// Number of optional tasks
    #[must_use]
    pub fn optional_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.optional).count()
    }
}
