//! Test buses — mock `EventBus` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ledgerbank_core::bus::EventBus;
use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::StoredEvent;

/// An event bus that records every publish, in order.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<(String, StoredEvent)>>,
}

impl RecordingEventBus {
    /// Creates an empty recording bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all `(topic, event)` pairs published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, StoredEvent)> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the topics published to, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn topics(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, topic: &str, event: &StoredEvent) -> Result<(), DomainError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), event.clone()));
        Ok(())
    }
}

/// An event bus with a toggleable outage: publishes fail while unavailable
/// and are recorded once the bus recovers. Drives publish-after-append
/// durability tests.
#[derive(Debug)]
pub struct FlakyEventBus {
    available: AtomicBool,
    published: Mutex<Vec<(String, StoredEvent)>>,
}

impl FlakyEventBus {
    /// Creates a bus that starts in an outage.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: AtomicBool::new(false),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Flips the outage switch.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns a snapshot of all `(topic, event)` pairs that got through.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, StoredEvent)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for FlakyEventBus {
    async fn publish(&self, topic: &str, event: &StoredEvent) -> Result<(), DomainError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DomainError::PublishFailed {
                topic: topic.to_owned(),
                reason: "bus unavailable".into(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), event.clone()));
        Ok(())
    }
}
