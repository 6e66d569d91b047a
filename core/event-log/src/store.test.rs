use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

fn intent_event(task_id: &str) -> Event {
    Event::new(
        task_id,
        Mode::Mission,
        Stage::Intent,
        EventPayload::IntentReceived {
            intent: "fix the bug".to_string(),
        },
    )
}

#[tokio::test]
async fn append_then_get_all_returns_in_append_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::open(dir.path().join("events.jsonl")).await.expect("open");

    let e1 = intent_event("task-1");
    let e2 = intent_event("task-2");
    store.append(e1.clone()).await.expect("append 1");
    store.append(e2.clone()).await.expect("append 2");

    let all = store.get_all().await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].event_id, e1.event_id);
    assert_eq!(all[1].event_id, e2.event_id);
}

#[tokio::test]
async fn p2_durability_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    {
        let store = EventStore::open(&path).await.expect("open");
        store.append(intent_event("task-1")).await.expect("append");
    }
    let reopened = EventStore::open(&path).await.expect("reopen");
    assert_eq!(reopened.count().await, 1);
}

#[tokio::test]
async fn get_by_task_and_get_by_id_filter_correctly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::open(dir.path().join("events.jsonl")).await.expect("open");
    let e1 = intent_event("task-1");
    let e2 = intent_event("task-2");
    store.append(e1.clone()).await.expect("append");
    store.append(e2.clone()).await.expect("append");

    assert_eq!(store.get_by_task("task-1").await.len(), 1);
    assert_eq!(store.get_by_id(&e2.event_id).await.unwrap().task_id, "task-2");
    assert!(store.get_by_id("missing").await.is_none());
}

#[tokio::test]
async fn corrupt_line_on_reopen_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    tokio::fs::write(&path, "not json\n").await.expect("seed corrupt file");
    let result = EventStore::open(&path).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn get_by_type_filters_on_payload_tag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EventStore::open(dir.path().join("events.jsonl")).await.expect("open");
    store.append(intent_event("task-1")).await.expect("append");
    store
        .append(Event::new(
            "task-1",
            Mode::Mission,
            Stage::Plan,
            EventPayload::PlanProposed {
                summary: "plan".to_string(),
            },
        ))
        .await
        .expect("append");

    let intents = store.get_by_type(corestack_protocol::EventType::IntentReceived).await;
    assert_eq!(intents.len(), 1);
}
