//! In-memory implementation of the event bus.
//!
//! Publishes are retained in a single globally ordered log; a subscription
//! first replays the backlog for its topics and then receives live
//! publishes. Acknowledgements are no-ops — the in-memory bus never
//! redelivers.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use ledgerbank_core::bus::{DeliveredEvent, EventBus, EventSubscription};
use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::StoredEvent;

struct Subscriber {
    topics: HashSet<String>,
    sender: mpsc::UnboundedSender<DeliveredEvent>,
}

#[derive(Default)]
struct Inner {
    log: Vec<(String, StoredEvent)>,
    subscribers: Vec<Subscriber>,
}

/// Event bus holding topics in process memory.
#[derive(Default)]
pub struct InMemoryEventBus {
    inner: Mutex<Inner>,
}

impl InMemoryEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a subscription over `topics`. Events already published on those
    /// topics are replayed into the subscription in their original order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn subscribe(&self, topics: &[&str]) -> InMemorySubscription {
        let topics: HashSet<String> = topics.iter().map(|&topic| topic.to_owned()).collect();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut inner = self.inner.lock().unwrap();
        for (topic, event) in &inner.log {
            if topics.contains(topic) {
                // A freshly created channel cannot be closed yet.
                let _ = sender.send(delivery(topic, event));
            }
        }
        inner.subscribers.push(Subscriber { topics, sender });

        InMemorySubscription { receiver }
    }
}

fn delivery(topic: &str, event: &StoredEvent) -> DeliveredEvent {
    DeliveredEvent {
        topic: topic.to_owned(),
        event: event.clone(),
        delivery_tag: event.event_id.to_string(),
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, event: &StoredEvent) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| {
            DomainError::PublishFailed {
                topic: topic.to_owned(),
                reason: "bus state poisoned".into(),
            }
        })?;
        inner.log.push((topic.to_owned(), event.clone()));
        inner.subscribers.retain(|subscriber| {
            if !subscriber.topics.contains(topic) {
                return true;
            }
            subscriber.sender.send(delivery(topic, event)).is_ok()
        });
        Ok(())
    }
}

/// Consumer side of the in-memory bus.
pub struct InMemorySubscription {
    receiver: mpsc::UnboundedReceiver<DeliveredEvent>,
}

#[async_trait]
impl EventSubscription for InMemorySubscription {
    async fn next(&mut self) -> Result<Option<DeliveredEvent>, DomainError> {
        Ok(self.receiver.recv().await)
    }

    async fn ack(&mut self, _delivery: &DeliveredEvent) -> Result<(), DomainError> {
        Ok(())
    }
}
