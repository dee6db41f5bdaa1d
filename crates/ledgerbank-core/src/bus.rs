//! Event bus abstraction — the publish side and the consumer seam.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Publishes persisted events to downstream consumers.
///
/// Delivery is at-least-once; consumers must be idempotent on
/// `(aggregate_id, version)`. Per-aggregate ordering is preserved when the
/// substrate partitions by `aggregate_id`.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes `event` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PublishFailed`] when the substrate rejects the
    /// publish; the event store retries and parks exhausted events.
    async fn publish(&self, topic: &str, event: &StoredEvent) -> Result<(), DomainError>;
}

/// An event as delivered to a consumer, with the handle needed to
/// acknowledge it.
#[derive(Debug, Clone)]
pub struct DeliveredEvent {
    /// Topic the event arrived on.
    pub topic: String,
    /// The delivered event record.
    pub event: StoredEvent,
    /// Substrate-specific delivery handle used for acknowledgement.
    pub delivery_tag: String,
}

/// A consumer-side subscription over one or more topics.
#[async_trait]
pub trait EventSubscription: Send {
    /// Waits for the next delivery. Returns `Ok(None)` when the subscription
    /// has ended.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the substrate connection
    /// fails.
    async fn next(&mut self) -> Result<Option<DeliveredEvent>, DomainError>;

    /// Acknowledges a delivery so the substrate will not redeliver it.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the acknowledgement
    /// cannot be recorded.
    async fn ack(&mut self, delivery: &DeliveredEvent) -> Result<(), DomainError>;
}
