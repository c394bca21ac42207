//! Debounced notes writer
//!
//! Typing into a notes field produces a burst of edits. Each edit restarts
//! the task's quiet period; only the last text is written once the period
//! elapses. Writes run on a detached task, so dropping the handle doesn't
//! cancel them: whatever is still scheduled is written before the worker
//! exits.

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::Tracker;
use roadmap_catalog::TaskId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

enum Command {
    Edit { task: TaskId, notes: String },
    Flush(oneshot::Sender<usize>),
}

/// Handle to the notes writer
#[derive(Debug, Clone)]
pub struct NotesDebouncer {
    tracker: Arc<Tracker>,
    tx: mpsc::UnboundedSender<Command>,
}

impl NotesDebouncer {
    /// Start the writer for `tracker`
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(tracker: Arc<Tracker>, quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(Arc::clone(&tracker), quiet, rx));
        Self { tracker, tx }
    }

    /// Schedule `notes` as the new text of `task`
    ///
    /// # Errors
    /// Returns [`TrackerError::UnknownTask`] for ids outside the catalog.
    pub fn edit(&self, task: &TaskId, notes: impl Into<String>) -> TrackerResult<()> {
        if !self.tracker.catalog().contains(task) {
            return Err(TrackerError::UnknownTask(task.clone()));
        }
        let command = Command::Edit {
            task: task.clone(),
            notes: notes.into(),
        };
        if self.tx.send(command).is_err() {
            tracing::warn!(task = %task, "notes writer stopped, edit dropped");
        }
        Ok(())
    }

    /// Write every scheduled edit now; returns how many were written
    pub async fn flush(&self) -> usize {
        let (reply, done) = oneshot::channel();
        if self.tx.send(Command::Flush(reply)).is_err() {
            return 0;
        }
        done.await.unwrap_or(0)
    }
}

async fn run(tracker: Arc<Tracker>, quiet: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut scheduled: HashMap<TaskId, (String, Instant)> = HashMap::new();

    loop {
        let next_due = scheduled.values().map(|(_, due)| *due).min();
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Edit { task, notes }) => {
                    scheduled.insert(task, (notes, Instant::now() + quiet));
                }
                Some(Command::Flush(reply)) => {
                    let written = write_all(&tracker, scheduled.drain().collect()).await;
                    let _ = reply.send(written);
                }
                None => {
                    write_all(&tracker, scheduled.drain().collect()).await;
                    break;
                }
            },
            () = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                let now = Instant::now();
                let due: Vec<TaskId> = scheduled
                    .iter()
                    .filter(|(_, (_, at))| *at <= now)
                    .map(|(task, _)| task.clone())
                    .collect();
                let batch = due
                    .into_iter()
                    .filter_map(|task| scheduled.remove(&task).map(|entry| (task, entry)))
                    .collect();
                write_all(&tracker, batch).await;
            }
        }
    }
    tracing::debug!("notes writer stopped");
}

async fn write_all(tracker: &Tracker, batch: Vec<(TaskId, (String, Instant))>) -> usize {
    let mut written = 0;
    for (task, (notes, _)) in batch {
        match tracker.set_notes(&task, notes).await {
            Ok(outcome) => {
                written += 1;
                if outcome.remote_failed() {
                    tracing::warn!(task = %task, "notes saved locally only");
                }
            }
            Err(e) => tracing::warn!(task = %task, error = %e, "notes write failed"),
        }
    }
    written
}
