use corestack_event_log::EventStore;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

#[test]
fn recommend_discards_tasks_past_the_age_threshold() {
    assert_eq!(recommend(Duration::hours(25), true), RecoveryRecommendation::Discard);
    assert_eq!(recommend(Duration::hours(25), false), RecoveryRecommendation::Discard);
}

#[test]
fn recommend_restores_checkpoint_when_unclean_and_younger() {
    assert_eq!(recommend(Duration::hours(1), true), RecoveryRecommendation::RestoreCheckpoint);
}

#[test]
fn recommend_resumes_when_unclean_and_no_checkpoint() {
    assert_eq!(recommend(Duration::hours(1), false), RecoveryRecommendation::Resume);
}

async fn append_with_age(store: &EventStore, task_id: &str, payload: EventPayload, now: DateTime<Utc>, age: Duration) {
    let mut event = Event::new(task_id, Mode::Mission, Stage::Edit, payload);
    event.timestamp = now - age;
    store.append(event).await.expect("append");
}

/// spec.md §8 S6: two interrupted tasks, one too old to bother with, one
/// recent with a checkpoint to fall back on.
#[tokio::test]
async fn s6_crash_recovery_recommendation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::open(dir.path().join("events.jsonl")).await.expect("open store");
    let now = Utc::now();

    append_with_age(&store, "task-old", EventPayload::IntentReceived { intent: "old task".to_string() }, now, Duration::hours(25)).await;

    append_with_age(&store, "task-recent", EventPayload::IntentReceived { intent: "recent task".to_string() }, now, Duration::hours(1)).await;
    append_with_age(
        &store,
        "task-recent",
        EventPayload::CheckpointCreated {
            checkpoint_id: "cp-1".to_string(),
            scope: vec!["a.rs".to_string()],
            description: "pre-edit".to_string(),
        },
        now,
        Duration::hours(1),
    )
    .await;

    let analyses = analyze_tasks(&store, now).await;
    assert_eq!(analyses.len(), 2);

    let old = analyses.iter().find(|a| a.task_id == "task-old").expect("old task analysis");
    assert_eq!(old.recommendation, RecoveryRecommendation::Discard);

    let recent = analyses.iter().find(|a| a.task_id == "task-recent").expect("recent task analysis");
    assert!(recent.has_checkpoint);
    assert_eq!(recent.recommendation, RecoveryRecommendation::RestoreCheckpoint);
}

#[tokio::test]
async fn cleanly_exited_tasks_are_excluded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::open(dir.path().join("events.jsonl")).await.expect("open store");
    let now = Utc::now();

    append_with_age(&store, "task-done", EventPayload::IntentReceived { intent: "done task".to_string() }, now, Duration::hours(30)).await;
    append_with_age(&store, "task-done", EventPayload::MissionCompleted { success: true }, now, Duration::hours(30)).await;

    let analyses = analyze_tasks(&store, now).await;
    assert!(analyses.is_empty());
}
