//! Event repository abstraction — the durable layer beneath the event store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
///
/// Records are keyed by `(aggregate_id, version)`, which is unique; they are
/// written once and never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Aggregate type discriminator.
    pub aggregate_type: String,
    /// Event type discriminator, also the bus topic the event is published on.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// 0-based position within the aggregate stream.
    pub version: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Repository trait for loading and appending domain events.
///
/// Implementations must reject an append whose `expected_version` does not
/// match the stream's latest version, and must never admit two records with
/// the same `(aggregate_id, version)`.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by ascending version.
    /// Returns an empty vector when the aggregate has no history.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    ///
    /// `expected_version` is the last version the caller observed, or `-1`
    /// for a stream expected to be new. The batch is atomic: either all
    /// events become visible or none do.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
