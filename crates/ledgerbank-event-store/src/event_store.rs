//! The event store: per-aggregate append-only log with optimistic
//! concurrency and durable publish to the event bus.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use ledgerbank_core::bus::EventBus;
use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::{EventRepository, StoredEvent};

/// Default bound on re-publication attempts for a single event.
pub const DEFAULT_PUBLISH_RETRY_MAX: u32 = 5;

const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Append-only event store over a durable repository and an event bus.
///
/// Appends are atomic per batch and guarded by a compare-and-swap on the
/// stream's latest version. After a durable write every event is published
/// on the topic named by its `event_type`, in append order; publishes that
/// keep failing are parked and re-driven by [`EventStore::republish_pending`]
/// so that every durable event eventually reaches the bus at least once.
pub struct EventStore {
    repository: Arc<dyn EventRepository>,
    bus: Arc<dyn EventBus>,
    publish_retry_max: u32,
    pending: Mutex<VecDeque<(String, StoredEvent)>>,
}

impl EventStore {
    /// Creates a store over `repository` and `bus` with the default publish
    /// retry bound.
    #[must_use]
    pub fn new(repository: Arc<dyn EventRepository>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            repository,
            bus,
            publish_retry_max: DEFAULT_PUBLISH_RETRY_MAX,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Overrides the bound on re-publication attempts per event.
    #[must_use]
    pub fn with_publish_retry_max(mut self, publish_retry_max: u32) -> Self {
        self.publish_retry_max = publish_retry_max;
        self
    }

    /// Appends `events` to the aggregate's stream and publishes them.
    ///
    /// Versions are assigned sequentially starting at `expected_version + 1`;
    /// the version of the last event in the batch is returned. An empty batch
    /// is a no-op returning `expected_version`. Publish failures after the
    /// durable write never fail the append.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ConcurrencyConflict`] when the stream's latest
    /// version does not match `expected_version`, or the repository's error
    /// when the durable write fails.
    pub async fn append(
        &self,
        aggregate_id: Uuid,
        mut events: Vec<StoredEvent>,
        expected_version: i64,
    ) -> Result<i64, DomainError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let mut version = expected_version;
        for event in &mut events {
            version += 1;
            event.version = version;
        }

        self.repository
            .append_events(aggregate_id, expected_version, &events)
            .await?;

        // Parked events go first so per-topic order survives an outage.
        self.flush_pending().await;
        for event in &events {
            self.publish_with_retry(event).await;
        }

        Ok(version)
    }

    /// Loads the aggregate's events in ascending version order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AggregateNotFound`] when the stream is empty,
    /// so callers can distinguish "new" from "empty history".
    pub async fn load(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let events = self.repository.load_events(aggregate_id).await?;
        if events.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        Ok(events)
    }

    /// Re-drives parked publications, oldest first.
    ///
    /// Returns how many events were republished. Stops at the first event
    /// the bus still rejects, leaving it and everything behind it parked.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PublishFailed`] when the bus rejects the head
    /// of the queue.
    pub async fn republish_pending(&self) -> Result<usize, DomainError> {
        let mut pending = self.pending.lock().await;
        let mut republished = 0;
        while let Some((topic, event)) = pending.pop_front() {
            match self.bus.publish(&topic, &event).await {
                Ok(()) => republished += 1,
                Err(err) => {
                    pending.push_front((topic, event));
                    return Err(err);
                }
            }
        }
        Ok(republished)
    }

    /// Number of events currently parked for re-publication.
    pub async fn pending_publications(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn flush_pending(&self) {
        if let Err(err) = self.republish_pending().await {
            tracing::debug!(error = %err, "parked publications still failing");
        }
    }

    async fn publish_with_retry(&self, event: &StoredEvent) {
        let topic = event.event_type.clone();
        let mut attempt = 0;
        loop {
            match self.bus.publish(&topic, event).await {
                Ok(()) => return,
                Err(err) if attempt < self.publish_retry_max => {
                    tracing::warn!(
                        topic = %topic,
                        event_id = %event.event_id,
                        attempt,
                        error = %err,
                        "publish failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(
                        topic = %topic,
                        event_id = %event.event_id,
                        error = %err,
                        "publish retries exhausted, parking event for republication"
                    );
                    self.pending.lock().await.push_back((topic, event.clone()));
                    return;
                }
            }
        }
    }
}
