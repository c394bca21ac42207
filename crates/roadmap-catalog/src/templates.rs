//! Task templates
//!
//! Shorthand constructors for the common task shapes. Every template starts
//! from [`TaskDef::basic`] and layers its own defaults on top; the `with_*`
//! setters override anything afterwards.

use crate::types::{Priority, Status, TaskDef, TaskId, TaskLink};

/// Effort estimate given to tasks that don't specify one
pub const DEFAULT_ESTIMATE: &str = "1 day";

/// Evidence label used by [`TaskDef::with_file`] when none is given
pub const DEFAULT_FILE_LABEL: &str = "Required document";

impl TaskDef {
    /// Blocked, medium-priority mandatory task
    #[must_use]
    pub fn basic(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(id),
            title: title.into(),
            description: String::new(),
            optional: false,
            default_status: Status::Blocked,
            priority: Some(Priority::Medium),
            estimated_time: Some(DEFAULT_ESTIMATE.to_string()),
            links: Vec::new(),
            tip: None,
            consequences: None,
            file_required: None,
            optional_reason: None,
        }
    }

    /// Mandatory task with critical priority
    #[must_use]
    pub fn critical(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::basic(id, title).with_priority(Priority::Critical)
    }

    /// Mandatory task with high priority
    #[must_use]
    pub fn important(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::basic(id, title).with_priority(Priority::High)
    }

    /// Low-priority optional task
    #[must_use]
    pub fn optional(id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut task = Self::basic(id, title).with_priority(Priority::Low);
        task.optional = true;
        task
    }

    /// Task that expects an uploaded document
    #[must_use]
    pub fn with_file(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::basic(id, title).with_file_required(DEFAULT_FILE_LABEL)
    }

    /// Task carrying reference links
    #[must_use]
    pub fn with_links(
        id: impl Into<String>,
        title: impl Into<String>,
        links: Vec<TaskLink>,
    ) -> Self {
        let mut task = Self::basic(id, title);
        task.links = links;
        task
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// With default status
    #[inline]
    #[must_use]
    pub fn with_default_status(mut self, status: Status) -> Self {
        self.default_status = status;
        self
    }

    /// With tip
    #[inline]
    #[must_use]
    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = Some(tip.into());
        self
    }

    /// With required document label
    #[inline]
    #[must_use]
    pub fn with_file_required(mut self, label: impl Into<String>) -> Self {
        self.file_required = Some(label.into());
        self
    }

    /// Mark optional, recording why
    #[inline]
    #[must_use]
    pub fn optional_because(mut self, reason: impl Into<String>) -> Self {
        self.optional = true;
        self.optional_reason = Some(reason.into());
        self
    }
}

impl TaskLink {
    /// Link without description
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: None,
        }
    }
}
