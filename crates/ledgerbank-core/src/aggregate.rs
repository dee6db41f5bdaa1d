//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// An aggregate starts at version `-1` and stays there until the rehydrator
/// or a save sets the version from persisted records; `raise` never numbers
/// events itself. The uncommitted buffer holds events emitted by command
/// handling until the event store persists them.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Creates a fresh aggregate with no history (version `-1`).
    fn new(id: Uuid) -> Self
    where
        Self: Sized;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the version of the last persisted event, or `-1`.
    fn version(&self) -> i64;

    /// Sets the version after rehydration or a successful save.
    fn set_version(&mut self, version: i64);

    /// Apply an event to mutate internal state.
    fn apply(&mut self, event: &Self::Event);

    /// Push an event onto the uncommitted buffer without applying it.
    fn record(&mut self, event: Self::Event);

    /// Returns uncommitted events produced by command handling, in emission
    /// order.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Raise a new event: apply it to in-memory state and buffer it for
    /// persistence.
    fn raise(&mut self, event: Self::Event) {
        self.apply(&event);
        self.record(event);
    }

    /// Apply historical events in order without buffering; used for
    /// rehydration.
    fn replay<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::aggregate::AggregateRoot;
    use crate::error::DomainError;
    use crate::event::{DomainEvent, EventMetadata};
    use crate::repository::StoredEvent;

    #[derive(Debug, Clone)]
    struct Ticked {
        metadata: EventMetadata,
        amount: i64,
    }

    impl DomainEvent for Ticked {
        fn event_type(&self) -> &'static str {
            "test.ticked"
        }

        fn aggregate_type() -> &'static str {
            "test.counter"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "amount": self.amount })
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }

        fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
            Err(DomainError::UnknownEventType {
                event_type: stored.event_type.clone(),
            })
        }
    }

    struct Counter {
        id: Uuid,
        version: i64,
        total: i64,
        uncommitted_events: Vec<Ticked>,
    }

    impl AggregateRoot for Counter {
        type Event = Ticked;

        fn new(id: Uuid) -> Self {
            Self {
                id,
                version: -1,
                total: 0,
                uncommitted_events: Vec::new(),
            }
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn set_version(&mut self, version: i64) {
            self.version = version;
        }

        fn apply(&mut self, event: &Self::Event) {
            self.total += event.amount;
        }

        fn record(&mut self, event: Self::Event) {
            self.uncommitted_events.push(event);
        }

        fn uncommitted_events(&self) -> &[Self::Event] {
            &self.uncommitted_events
        }

        fn clear_uncommitted_events(&mut self) {
            self.uncommitted_events.clear();
        }
    }

    fn ticked(aggregate_id: Uuid, amount: i64) -> Ticked {
        Ticked {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                aggregate_id,
                version: -1,
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
                occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            },
            amount,
        }
    }

    #[test]
    fn test_raise_applies_and_buffers_without_touching_version() {
        let id = Uuid::new_v4();
        let mut counter = Counter::new(id);

        counter.raise(ticked(id, 3));
        counter.raise(ticked(id, 4));

        assert_eq!(counter.total, 7);
        assert_eq!(counter.uncommitted_events().len(), 2);
        assert_eq!(counter.version(), -1);
    }

    #[test]
    fn test_replay_applies_without_buffering() {
        let id = Uuid::new_v4();
        let history = vec![ticked(id, 5), ticked(id, -2)];
        let mut counter = Counter::new(id);

        counter.replay(history.iter());

        assert_eq!(counter.total, 3);
        assert!(counter.uncommitted_events().is_empty());
    }

    #[test]
    fn test_clear_uncommitted_events_empties_the_buffer() {
        let id = Uuid::new_v4();
        let mut counter = Counter::new(id);
        counter.raise(ticked(id, 1));

        counter.clear_uncommitted_events();

        assert!(counter.uncommitted_events().is_empty());
        assert_eq!(counter.total, 1);
    }
}
