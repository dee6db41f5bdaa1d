//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// 0-based position within the aggregate stream. Events are raised with
    /// `-1`; the event store assigns the real version on append.
    pub version: i64,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all domain events implement.
///
/// An event is an immutable fact; its type discriminator routes both state
/// application during replay and the bus topic it is published on.
pub trait DomainEvent: Sized + Send + Sync + std::fmt::Debug {
    /// Returns the event type discriminator (also the bus topic name).
    fn event_type(&self) -> &'static str;

    /// Returns the aggregate type discriminator for the stream.
    fn aggregate_type() -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Reconstructs the event from its stored record.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownEventType`] when the record's
    /// `event_type` is not one this event understands — callers on the
    /// replay path log and skip such records rather than failing.
    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError>;
}

/// Builds the stored record for a domain event, ready for the event store.
///
/// The record's version is whatever the metadata carries; the event store
/// overwrites it with the stream position it assigns on append.
pub fn to_stored<E: DomainEvent>(event: &E) -> StoredEvent {
    let meta = event.metadata();
    StoredEvent {
        event_id: meta.event_id,
        aggregate_id: meta.aggregate_id,
        aggregate_type: E::aggregate_type().to_owned(),
        event_type: event.event_type().to_owned(),
        payload: event.to_payload(),
        version: meta.version,
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    }
}
