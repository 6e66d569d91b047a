use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

struct CountingSubscriber {
    count: Arc<AtomicUsize>,
}

impl EventSubscriber for CountingSubscriber {
    fn on_event(&self, _event: &Event) -> Result<(), String> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingSubscriber;

impl EventSubscriber for FailingSubscriber {
    fn on_event(&self, _event: &Event) -> Result<(), String> {
        Err("boom".to_string())
    }
}

#[tokio::test]
async fn subscriber_sees_only_persisted_events_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(EventStore::open(dir.path().join("events.jsonl")).await.expect("open"));
    let bus = EventBus::new(store);

    let count = Arc::new(AtomicUsize::new(0));
    bus.subscribe(Arc::new(CountingSubscriber { count: count.clone() })).await;

    bus.publish(Event::new(
        "task-1",
        Mode::Mission,
        Stage::Intent,
        EventPayload::IntentReceived {
            intent: "go".to_string(),
        },
    ))
    .await
    .expect("publish");

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_subscriber_does_not_affect_persistence_or_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(EventStore::open(dir.path().join("events.jsonl")).await.expect("open"));
    let bus = EventBus::new(store.clone());

    let count = Arc::new(AtomicUsize::new(0));
    bus.subscribe(Arc::new(FailingSubscriber)).await;
    bus.subscribe(Arc::new(CountingSubscriber { count: count.clone() })).await;

    let result = bus
        .publish(Event::new(
            "task-1",
            Mode::Mission,
            Stage::Intent,
            EventPayload::IntentReceived {
                intent: "go".to_string(),
            },
        ))
        .await;

    assert!(result.is_ok());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(store.count().await, 1);
}
