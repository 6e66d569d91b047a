//! In-process publish/subscribe fan-out over the event store (spec.md
//! §4.2).
//!
//! Per the redesign flag in spec.md §9, subscribers are an explicit trait
//! returning a status rather than an untyped callback closure; a
//! subscriber's error is logged and does not affect persistence or other
//! subscribers.

use std::sync::Arc;

use corestack_protocol::Event;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::EventLogError;
use crate::store::EventStore;

/// A consumer of the live event stream. Invoked synchronously, in append
/// order, only for events that persisted successfully.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event. An `Err` is logged by the bus; it never rolls back
    /// the append or blocks delivery to other subscribers.
    fn on_event(&self, event: &Event) -> Result<(), String>;
}

impl<F> EventSubscriber for F
where
    F: Fn(&Event) -> Result<(), String> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> Result<(), String> {
        self(event)
    }
}

/// Wraps an [`EventStore`]; the only component permitted to call
/// [`EventStore::append`] (spec.md §5 "Shared-resource policy").
pub struct EventBus {
    store: Arc<EventStore>,
    subscribers: Mutex<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventBus {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    /// Register a subscriber; it is invoked on every subsequent publish but
    /// not for events that already persisted before subscribing.
    pub async fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.lock().await.push(subscriber);
    }

    /// Persist `event` then fan it out to every subscriber in registration
    /// order. A subscriber is never invoked for an event that failed to
    /// persist.
    pub async fn publish(&self, event: Event) -> Result<Event, EventLogError> {
        self.store.append(event.clone()).await?;
        let subscribers = self.subscribers.lock().await.clone();
        for subscriber in subscribers.iter() {
            if let Err(message) = subscriber.on_event(&event) {
                warn!(event_id = %event.event_id, error = %message, "event subscriber failed");
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
#[path = "bus.test.rs"]
mod tests;
