//! Tracker flows over in-memory collaborators: unlock propagation,
//! optimistic writes, remote failures and restarts.

use pretty_assertions::assert_eq;
use roadmap_catalog::{PhaseId, Status, TaskId};
use roadmap_core::{RemoteWrite, TrackerError};
use roadmap_progress::ProgressPatch;
use roadmap_store::{load_progress, Session, UserId};
use roadmap_test_utils::{abc_harness, two_phase_catalog, Harness};

fn id(s: &str) -> TaskId {
    TaskId::new(s)
}

#[tokio::test]
async fn completing_mandatory_unlocks_next_mandatory() {
    let h = abc_harness();
    assert_eq!(h.tracker.status(&id("C")).await.unwrap(), Status::Blocked);

    let outcome = h.tracker.complete_task(&id("A")).await.unwrap();
    assert_eq!(outcome.unlocked.as_ref().map(|u| u.task_id.clone()), Some(id("C")));
    assert_eq!(outcome.completed.remote, RemoteWrite::LocalOnly);

    let progress = h.tracker.progress().await;
    assert_eq!(progress.status_of(&id("C")), Some(Status::Active));
    assert_eq!(progress.get(&id("B")), None);
}

#[tokio::test]
async fn completing_optional_writes_only_itself() {
    let h = abc_harness();
    let outcome = h.tracker.complete_task(&id("B")).await.unwrap();
    assert!(outcome.unlocked.is_none());

    let progress = h.tracker.progress().await;
    assert_eq!(progress.len(), 1);
    assert_eq!(h.tracker.status(&id("C")).await.unwrap(), Status::Blocked);
}

#[tokio::test]
async fn completed_follower_is_not_reopened() {
    let h = abc_harness();
    h.tracker
        .update_task(&id("C"), ProgressPatch::status(Status::Completed))
        .await
        .unwrap();

    let outcome = h.tracker.complete_task(&id("A")).await.unwrap();
    assert!(outcome.unlocked.is_none());
    assert_eq!(h.tracker.status(&id("C")).await.unwrap(), Status::Completed);
}

#[tokio::test]
async fn unlock_never_crosses_phases() {
    let h = Harness::new(two_phase_catalog());
    h.tracker.complete_task(&id("a1")).await.unwrap();
    let last = h.tracker.complete_task(&id("a2")).await.unwrap();
    assert!(last.unlocked.is_none());

    let progress = h.tracker.progress().await;
    assert_eq!(progress.get(&id("b1")), None);
    assert_eq!(h.tracker.status(&id("b1")).await.unwrap(), Status::Active);

    let view = h.tracker.roadmap().await;
    assert_eq!(view.current_phase, Some(PhaseId::new("second")));
    assert!(view.phases[1].unlocked);
    assert_eq!((view.overall.completed, view.overall.total), (2, 4));
    assert_eq!((view.optional.completed, view.optional.total), (0, 1));
}

#[tokio::test]
async fn local_cache_is_written_before_memory() {
    let h = abc_harness();
    h.tracker.set_notes(&id("A"), "bring copies").await.unwrap();

    let cached = load_progress(h.cache.as_ref()).await.unwrap();
    assert_eq!(cached, h.tracker.progress().await);
    assert_eq!(
        cached.get(&id("A")).and_then(|r| r.notes.as_deref()),
        Some("bring copies")
    );
}

#[tokio::test]
async fn remote_failure_keeps_local_state_and_can_be_retried() {
    let h = abc_harness();
    h.tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    h.records.fail_task("A");

    let outcome = h.tracker.complete_task(&id("A")).await.unwrap();
    assert!(outcome.completed.remote_failed());
    assert_eq!(
        outcome.unlocked.as_ref().map(|u| u.remote.clone()),
        Some(RemoteWrite::Stored)
    );
    assert_eq!(h.tracker.status(&id("A")).await.unwrap(), Status::Completed);
    assert!(load_progress(h.cache.as_ref())
        .await
        .unwrap()
        .is_completed(&id("A")));
    assert_eq!(h.tracker.pending(), vec![id("A")]);

    h.records.heal_task("A");
    let report = h.tracker.retry_pending().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert!(report.is_clean());
    assert!(h.tracker.pending().is_empty());

    let row = h.records.inner().get(&UserId::new("u1"), &id("A")).unwrap();
    assert_eq!(row.record.status, Status::Completed);
    assert!(row.completed_at.is_some());
}

#[tokio::test]
async fn offline_load_falls_back_to_local_cache() {
    let h = abc_harness();
    h.tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    h.tracker.complete_task(&id("A")).await.unwrap();

    let restarted = h.restart();
    assert_eq!(
        restarted.restore_session().await.unwrap(),
        Some(Session::new("u1"))
    );
    h.records.set_offline(true);
    restarted.load().await.unwrap();

    assert_eq!(restarted.status(&id("A")).await.unwrap(), Status::Completed);
    assert_eq!(restarted.status(&id("C")).await.unwrap(), Status::Active);
}

#[tokio::test]
async fn guest_progress_survives_restart() {
    let h = abc_harness();
    h.tracker.complete_task(&id("A")).await.unwrap();

    let restarted = h.restart();
    assert_eq!(restarted.restore_session().await.unwrap(), None);
    restarted.load().await.unwrap();
    assert_eq!(restarted.progress().await, h.tracker.progress().await);
}

#[tokio::test]
async fn attachments_resolve_to_signed_links() {
    let h = abc_harness();
    let outcome = h
        .tracker
        .attach_file(&id("A"), "birth certificate.pdf", b"%PDF")
        .await
        .unwrap();
    let file = outcome.record.uploaded_file.clone().unwrap();
    assert!(file.as_str().ends_with("birth_certificate.pdf"));
    assert_eq!(outcome.record.status, Status::Active);

    let link = h.tracker.download_link(&id("A")).await.unwrap();
    assert!(link.url.contains(file.as_str()));

    assert!(matches!(
        h.tracker.download_link(&id("C")).await,
        Err(TrackerError::NoAttachment(_))
    ));
}
