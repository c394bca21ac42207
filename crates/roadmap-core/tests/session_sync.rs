//! Reconciliation between guest progress and the remote store on sign-in
//! and sign-out.

use chrono::Utc;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use roadmap_catalog::{Status, TaskId};
use roadmap_core::Tracker;
use roadmap_progress::{ProgressPatch, ProgressRecord};
use roadmap_store::{
    load_progress, IdentityProvider, Session, StaticIdentity, StoredRecord, UserId,
};
use roadmap_test_utils::abc_harness;
use std::sync::Arc;
use std::time::Duration;

fn id(s: &str) -> TaskId {
    TaskId::new(s)
}

fn remote_row(user: &str, task: &str, status: Status) -> StoredRecord {
    StoredRecord::new(
        UserId::new(user),
        id(task),
        ProgressRecord::new(status),
        Utc::now(),
    )
}

#[tokio::test]
async fn sign_in_pushes_local_then_overlays_on_remote() {
    let h = abc_harness();
    h.tracker.complete_task(&id("A")).await.unwrap();
    h.tracker.set_notes(&id("B"), "skip if busy").await.unwrap();

    h.records.seed(remote_row("u1", "A", Status::Active)).await;
    h.records.seed(remote_row("u1", "C", Status::Completed)).await;
    h.records.fail_task("B");

    let report = h
        .tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();

    // A and C (activated by the unlock) pushed, B rejected
    assert_eq!(report.pushed, 2);
    assert_eq!(report.failed, vec![id("B")]);
    assert_eq!(h.tracker.pending(), vec![id("B")]);

    let progress = h.tracker.progress().await;
    assert_eq!(progress.status_of(&id("A")), Some(Status::Completed));
    assert_eq!(
        progress.get(&id("B")).and_then(|r| r.notes.as_deref()),
        Some("skip if busy")
    );
    // local wins over remote for C as well
    assert_eq!(progress.status_of(&id("C")), Some(Status::Active));

    assert_eq!(load_progress(h.cache.as_ref()).await.unwrap(), progress);
}

#[tokio::test]
async fn remote_only_records_are_merged_in() {
    let h = abc_harness();
    h.tracker.set_notes(&id("B"), "local").await.unwrap();
    h.records.seed(remote_row("u1", "A", Status::Completed)).await;

    let report = h
        .tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    assert_eq!(report.pushed, 1);
    assert!(report.is_clean());

    let progress = h.tracker.progress().await;
    assert_eq!(progress.status_of(&id("A")), Some(Status::Completed));
    assert_eq!(progress.len(), 2);
    assert_eq!(h.tracker.status(&id("C")).await.unwrap(), Status::Active);
}

#[tokio::test]
async fn unreachable_remote_keeps_local_progress() {
    let h = abc_harness();
    h.tracker.complete_task(&id("A")).await.unwrap();
    h.records.set_offline(true);

    let report = h
        .tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    assert_eq!(report.pushed, 0);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(h.tracker.status(&id("A")).await.unwrap(), Status::Completed);

    h.records.set_offline(false);
    let retried = h.tracker.retry_pending().await.unwrap();
    assert_eq!(retried.pushed, 2);
    assert_eq!(h.records.upserts(), 2);
}

#[tokio::test]
async fn repeated_session_is_a_no_op() {
    let h = abc_harness();
    h.tracker.complete_task(&id("A")).await.unwrap();
    h.tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    let upserts = h.records.upserts();

    let report = h
        .tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    assert_eq!(report.pushed, 0);
    assert_eq!(h.records.upserts(), upserts);
}

#[tokio::test]
async fn switching_users_does_not_leak_progress() {
    let h = abc_harness();
    h.tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    h.tracker.complete_task(&id("A")).await.unwrap();

    h.records.seed(remote_row("u2", "B", Status::Completed)).await;
    h.tracker
        .on_session_change(Some(Session::new("u2")))
        .await
        .unwrap();

    let progress = h.tracker.progress().await;
    assert_eq!(progress.len(), 1);
    assert!(progress.is_completed(&id("B")));
    assert!(h
        .records
        .inner()
        .get(&UserId::new("u2"), &id("A"))
        .is_none());
}

#[tokio::test]
async fn sign_out_returns_to_local_cache() {
    let h = abc_harness();
    h.tracker
        .on_session_change(Some(Session::new("u1")))
        .await
        .unwrap();
    h.tracker.complete_task(&id("A")).await.unwrap();

    h.tracker.on_session_change(None).await.unwrap();
    assert!(h.tracker.session().await.is_none());
    assert_eq!(h.tracker.status(&id("A")).await.unwrap(), Status::Completed);
    assert_eq!(h.restart().restore_session().await.unwrap(), None);
}

#[tokio::test]
async fn identity_transitions_drive_sync() {
    let h = abc_harness();
    h.tracker.complete_task(&id("A")).await.unwrap();

    let identity = StaticIdentity::guest();
    let watcher = h.tracker.watch_identity(&identity);
    identity.sign_in(Session::new("u1"));

    for _ in 0..100 {
        if h.records.upserts() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.records.upserts(), 2);
    assert_eq!(h.tracker.session().await, identity.current());

    drop(identity);
    watcher.await.unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    Complete(usize),
    Activate(usize),
    Note(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize).prop_map(Op::Complete),
        (0..3usize).prop_map(Op::Activate),
        (0..3usize).prop_map(Op::Note),
    ]
}

const TASKS: [&str; 3] = ["A", "B", "C"];

async fn apply(tracker: &Arc<Tracker>, op: &Op) {
    match op {
        Op::Complete(i) => {
            tracker.complete_task(&id(TASKS[*i])).await.unwrap();
        }
        Op::Activate(i) => {
            tracker.activate_task(&id(TASKS[*i])).await.unwrap();
        }
        Op::Note(i) => {
            tracker
                .update_task(&id(TASKS[*i]), ProgressPatch::notes("n"))
                .await
                .unwrap();
        }
    }
}

proptest! {
    #[test]
    fn cache_mirrors_memory_after_every_write(ops in prop::collection::vec(op(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let h = abc_harness();
            for op in &ops {
                apply(&h.tracker, op).await;
                let cached = load_progress(h.cache.as_ref()).await.unwrap();
                assert_eq!(cached, h.tracker.progress().await);
            }
        });
    }
}
