//! Application state
//!
//! [`Tracker`] owns the in-memory progress map, the current session and the
//! collaborator handles. Every write follows the same optimistic path: the
//! local cache is written first and acknowledges the change, then memory is
//! updated, then the remote store is tried. A remote failure never rolls the
//! local state back; the task is remembered as pending instead.

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::view::RoadmapView;
use chrono::Utc;
use roadmap_catalog::{Catalog, Status, TaskId};
use roadmap_progress::{next_unlock, resolve, ProgressMap, ProgressPatch, ProgressRecord};
use roadmap_store::{
    load_json, load_progress, save_progress, store_json, BlobStore, FileCache, FileRecordStore,
    IdentityProvider, LinkSigner, LocalBlobStore, LocalCache, RecordStore, Session, SignedLink,
    StoredRecord, SESSION_KEY,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// What happened to the remote copy of a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RemoteWrite {
    /// Upserted remotely
    Stored,
    /// Guest mode, local cache only
    LocalOnly,
    /// Remote upsert failed; the task is pending
    Failed {
        /// Backend error
        reason: String,
        /// Worth retrying later
        retryable: bool,
    },
}

/// Result of a single task write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Written task
    pub task_id: TaskId,
    /// Record as it now stands locally
    pub record: ProgressRecord,
    /// Fate of the remote copy
    pub remote: RemoteWrite,
}

impl UpdateOutcome {
    /// Remote copy is behind
    #[inline]
    #[must_use]
    pub fn remote_failed(&self) -> bool {
        matches!(self.remote, RemoteWrite::Failed { .. })
    }
}

/// Result of completing a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionOutcome {
    /// The completion itself
    pub completed: UpdateOutcome,
    /// Activation of the next mandatory task, if one was unlocked
    pub unlocked: Option<UpdateOutcome>,
}

/// Result of pushing records to the remote store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records upserted
    pub pushed: usize,
    /// Tasks whose upsert failed
    pub failed: Vec<TaskId>,
}

impl SyncReport {
    /// Nothing failed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    progress: ProgressMap,
    session: Option<Session>,
}

/// Progress tracker over one catalog
#[derive(Debug)]
pub struct Tracker {
    catalog: Arc<Catalog>,
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn LocalCache>,
    blobs: Arc<dyn BlobStore>,
    state: Mutex<TrackerState>,
    pending: parking_lot::Mutex<BTreeSet<TaskId>>,
}

impl Tracker {
    /// Tracker over explicit collaborators, starting as a guest with no progress
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn LocalCache>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            catalog,
            records,
            cache,
            blobs,
            state: Mutex::new(TrackerState::default()),
            pending: parking_lot::Mutex::new(BTreeSet::new()),
        }
    }

    /// Tracker with file-backed collaborators under `config.data_dir`
    ///
    /// # Errors
    /// Fails when the configured catalog can't be loaded.
    pub fn from_config(config: &TrackerConfig) -> TrackerResult<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        let signer = LinkSigner::new(
            config.link_base_url.clone(),
            config.blob_secret.clone(),
            config.link_validity(),
        );
        tracing::info!(
            data_dir = %config.data_dir.display(),
            phases = catalog.phases().len(),
            tasks = catalog.task_count(),
            "tracker configured"
        );
        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(FileRecordStore::new(config.records_dir())),
            Arc::new(FileCache::new(config.cache_dir())),
            Arc::new(LocalBlobStore::new(config.blobs_dir(), signer)),
        ))
    }

    /// Catalog being tracked
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Local cache handle
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &dyn LocalCache {
        self.cache.as_ref()
    }

    /// Current session
    pub async fn session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }

    /// Snapshot of the progress map
    pub async fn progress(&self) -> ProgressMap {
        self.state.lock().await.progress.clone()
    }

    /// Tasks whose remote copy is behind
    #[must_use]
    pub fn pending(&self) -> Vec<TaskId> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Effective status of a task
    ///
    /// # Errors
    /// Returns [`TrackerError::UnknownTask`] for ids outside the catalog.
    pub async fn status(&self, task: &TaskId) -> TrackerResult<Status> {
        let state = self.state.lock().await;
        resolve(&self.catalog, task, &state.progress)
            .ok_or_else(|| TrackerError::UnknownTask(task.clone()))
    }

    /// Snapshot of the whole roadmap
    pub async fn roadmap(&self) -> RoadmapView {
        let state = self.state.lock().await;
        RoadmapView::build(&self.catalog, &state.progress)
    }

    /// Adopt the session remembered in the local cache, without syncing
    ///
    /// # Errors
    /// Fails when the cache can't be read.
    pub async fn restore_session(&self) -> TrackerResult<Option<Session>> {
        let session: Option<Session> = load_json(self.cache.as_ref(), SESSION_KEY).await?;
        self.state.lock().await.session.clone_from(&session);
        Ok(session)
    }

    /// Populate the progress map
    ///
    /// Signed in: read the remote store and mirror it into the local cache.
    /// If the remote read fails the local cache is used. Guests read the
    /// local cache. An unreadable local cache starts empty.
    ///
    /// # Errors
    /// Fails only when mirroring remote state into the local cache fails.
    pub async fn load(&self) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        let local = self.read_local().await;

        let progress = match &state.session {
            Some(session) => match self.records.read_all(&session.user_id).await {
                Ok(rows) => {
                    let mut remote: ProgressMap =
                        rows.into_iter().map(|r| (r.task_id, r.record)).collect();
                    // writes the remote store hasn't seen yet stay visible
                    let pending = self.pending.lock().clone();
                    for task in pending {
                        if let Some(record) = local.get(&task) {
                            remote.insert(task, record.clone());
                        }
                    }
                    save_progress(self.cache.as_ref(), &remote).await?;
                    tracing::info!(user = %session.user_id, records = remote.len(), "loaded remote progress");
                    remote
                }
                Err(e) => {
                    tracing::warn!(user = %session.user_id, error = %e, "remote read failed, using local cache");
                    local
                }
            },
            None => {
                tracing::info!(records = local.len(), "loaded local progress");
                local
            }
        };
        state.progress = progress;
        Ok(())
    }

    /// Apply a partial update to one task
    ///
    /// # Errors
    /// Fails for unknown tasks and when the local cache can't be written;
    /// remote failures are reported in the outcome instead.
    pub async fn update_task(
        &self,
        task: &TaskId,
        patch: ProgressPatch,
    ) -> TrackerResult<UpdateOutcome> {
        self.ensure_known(task)?;
        let mut state = self.state.lock().await;
        self.write(&mut state, task, &patch).await
    }

    /// Mark a task completed and activate the next mandatory task of its phase
    ///
    /// Completing an optional task writes nothing else.
    ///
    /// # Errors
    /// See [`Tracker::update_task`].
    pub async fn complete_task(&self, task: &TaskId) -> TrackerResult<CompletionOutcome> {
        self.ensure_known(task)?;
        let mut state = self.state.lock().await;
        let completed = self
            .write(&mut state, task, &ProgressPatch::status(Status::Completed))
            .await?;

        let unlocked = match next_unlock(&self.catalog, task, &state.progress) {
            Some(next) => {
                tracing::info!(completed = %task, unlocked = %next, "task unlocked");
                Some(
                    self.write(&mut state, &next, &ProgressPatch::status(Status::Active))
                        .await?,
                )
            }
            None => None,
        };
        Ok(CompletionOutcome {
            completed,
            unlocked,
        })
    }

    /// Mark a task active
    ///
    /// # Errors
    /// See [`Tracker::update_task`].
    pub async fn activate_task(&self, task: &TaskId) -> TrackerResult<UpdateOutcome> {
        self.update_task(task, ProgressPatch::status(Status::Active))
            .await
    }

    /// Replace a task's notes
    ///
    /// # Errors
    /// See [`Tracker::update_task`].
    pub async fn set_notes(
        &self,
        task: &TaskId,
        notes: impl Into<String>,
    ) -> TrackerResult<UpdateOutcome> {
        self.update_task(task, ProgressPatch::notes(notes)).await
    }

    /// Upload a document and attach it to a task
    ///
    /// # Errors
    /// Fails for unknown tasks, failed uploads and local cache failures.
    pub async fn attach_file(
        &self,
        task: &TaskId,
        name: &str,
        bytes: &[u8],
    ) -> TrackerResult<UpdateOutcome> {
        self.ensure_known(task)?;
        let file = self.blobs.put(name, bytes).await?;
        tracing::info!(task = %task, file = %file, "document attached");
        self.update_task(task, ProgressPatch::file(file)).await
    }

    /// Signed download link for a task's document
    ///
    /// # Errors
    /// Returns [`TrackerError::NoAttachment`] when nothing was uploaded.
    pub async fn download_link(&self, task: &TaskId) -> TrackerResult<SignedLink> {
        self.ensure_known(task)?;
        let file = {
            let state = self.state.lock().await;
            state
                .progress
                .get(task)
                .and_then(|r| r.uploaded_file.clone())
                .ok_or_else(|| TrackerError::NoAttachment(task.clone()))?
        };
        Ok(self.blobs.resolve_download_link(&file).await?)
    }

    /// Push every pending task again
    ///
    /// # Errors
    /// Returns [`TrackerError::NotAuthenticated`] for guests.
    pub async fn retry_pending(&self) -> TrackerResult<SyncReport> {
        let state = self.state.lock().await;
        let session = state
            .session
            .clone()
            .ok_or(TrackerError::NotAuthenticated)?;

        let mut report = SyncReport::default();
        for task in self.pending() {
            let Some(record) = state.progress.get(&task).cloned() else {
                self.pending.lock().remove(&task);
                continue;
            };
            match self.push(&session, &task, record).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    tracing::warn!(task = %task, error = %e, "retry failed");
                    report.failed.push(task);
                }
            }
        }
        tracing::info!(pushed = report.pushed, failed = report.failed.len(), "pending writes retried");
        Ok(report)
    }

    /// React to a sign-in or sign-out
    ///
    /// On guest to signed-in, every local record is pushed individually
    /// (failures are collected and the rest continue), then remote state is
    /// reloaded with local records laid over it. Switching between users
    /// loads the new user's remote state without pushing. Signing out falls
    /// back to the local cache.
    ///
    /// # Errors
    /// Fails when the session or merged progress can't be cached.
    pub async fn on_session_change(&self, session: Option<Session>) -> TrackerResult<SyncReport> {
        let previous = self.state.lock().await.session.clone();
        if previous.as_ref().map(|s| &s.user_id) == session.as_ref().map(|s| &s.user_id) {
            return Ok(SyncReport::default());
        }

        match &session {
            Some(s) => store_json(self.cache.as_ref(), SESSION_KEY, s).await?,
            None => self.cache.remove(SESSION_KEY).await?,
        }
        self.pending.lock().clear();

        match (previous, session) {
            (None, Some(session)) => self.sign_in_sync(session).await,
            (Some(_), Some(session)) => {
                self.state.lock().await.session = Some(session);
                self.load().await?;
                Ok(SyncReport::default())
            }
            (Some(_), None) => {
                tracing::info!("session ended, back to local progress");
                self.state.lock().await.session = None;
                self.load().await?;
                Ok(SyncReport::default())
            }
            (None, None) => Ok(SyncReport::default()),
        }
    }

    /// Follow an identity provider until it's dropped
    pub fn watch_identity(self: &Arc<Self>, identity: &dyn IdentityProvider) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let mut rx = identity.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                if let Err(e) = tracker.on_session_change(session).await {
                    tracing::warn!(error = %e, "session change handling failed");
                }
            }
        })
    }

    async fn sign_in_sync(&self, session: Session) -> TrackerResult<SyncReport> {
        let mut state = self.state.lock().await;
        state.session = Some(session.clone());

        let local = match load_progress(self.cache.as_ref()).await {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!(error = %e, "local cache unreadable, pushing in-memory progress");
                state.progress.clone()
            }
        };

        let mut report = SyncReport::default();
        for (task, record) in local.iter() {
            match self.push(&session, task, record.clone()).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    tracing::warn!(user = %session.user_id, task = %task, error = %e, "sync upsert failed");
                    report.failed.push(task.clone());
                }
            }
        }

        state.progress = match self.records.read_all(&session.user_id).await {
            Ok(rows) => {
                let mut merged: ProgressMap =
                    rows.into_iter().map(|r| (r.task_id, r.record)).collect();
                merged.overlay(&local);
                save_progress(self.cache.as_ref(), &merged).await?;
                merged
            }
            Err(e) => {
                tracing::warn!(user = %session.user_id, error = %e, "remote reload failed, keeping local progress");
                local
            }
        };

        tracing::info!(
            user = %session.user_id,
            pushed = report.pushed,
            failed = report.failed.len(),
            "signed-in sync finished"
        );
        Ok(report)
    }

    async fn write(
        &self,
        state: &mut TrackerState,
        task: &TaskId,
        patch: &ProgressPatch,
    ) -> TrackerResult<UpdateOutcome> {
        let initial = resolve(&self.catalog, task, &state.progress).unwrap_or(Status::Active);
        let mut next = state.progress.clone();
        let record = next.apply_or(task, patch, initial);
        save_progress(self.cache.as_ref(), &next).await?;
        state.progress = next;
        tracing::debug!(task = %task, status = %record.status, "task written locally");

        let remote = match &state.session {
            None => RemoteWrite::LocalOnly,
            Some(session) => match self.push(session, task, record.clone()).await {
                Ok(()) => RemoteWrite::Stored,
                Err(e) => {
                    tracing::warn!(task = %task, error = %e, "remote write failed, kept locally");
                    RemoteWrite::Failed {
                        reason: e.to_string(),
                        retryable: e.is_retryable(),
                    }
                }
            },
        };

        Ok(UpdateOutcome {
            task_id: task.clone(),
            record,
            remote,
        })
    }

    async fn push(
        &self,
        session: &Session,
        task: &TaskId,
        record: ProgressRecord,
    ) -> Result<(), roadmap_store::StoreError> {
        let row = StoredRecord::new(session.user_id.clone(), task.clone(), record, Utc::now());
        match self.records.upsert(row).await {
            Ok(()) => {
                self.pending.lock().remove(task);
                Ok(())
            }
            Err(e) => {
                self.pending.lock().insert(task.clone());
                Err(e)
            }
        }
    }

    async fn read_local(&self) -> ProgressMap {
        match load_progress(self.cache.as_ref()).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(error = %e, "local cache unreadable, starting empty");
                ProgressMap::new()
            }
        }
    }

    fn ensure_known(&self, task: &TaskId) -> TrackerResult<()> {
        if self.catalog.contains(task) {
            Ok(())
        } else {
            Err(TrackerError::UnknownTask(task.clone()))
        }
    }
}
