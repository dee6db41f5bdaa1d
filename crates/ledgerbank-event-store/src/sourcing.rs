//! The event-sourcing handler: rehydrates aggregates from their history and
//! commits their uncommitted events through the event store.

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use ledgerbank_core::aggregate::AggregateRoot;
use ledgerbank_core::error::DomainError;
use ledgerbank_core::event::{DomainEvent, to_stored};

use crate::event_store::EventStore;

/// Repository for aggregates of type `A`, backed by the event store.
pub struct EventSourcingHandler<A> {
    store: Arc<EventStore>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: AggregateRoot> EventSourcingHandler<A> {
    /// Creates a handler over `store`.
    #[must_use]
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// Rehydrates the aggregate from its event history.
    ///
    /// Stored records whose event type the aggregate does not recognize are
    /// logged at warn level and skipped for state purposes; they still count
    /// towards the version, which is set to the highest stored version.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AggregateNotFound`] when the aggregate has no
    /// history, or a store error when loading or decoding fails.
    pub async fn get(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        let stored_events = self.store.load(aggregate_id).await?;

        let mut aggregate = A::new(aggregate_id);
        let mut latest_version = -1;
        let mut history = Vec::with_capacity(stored_events.len());
        for stored in &stored_events {
            latest_version = latest_version.max(stored.version);
            match A::Event::from_stored(stored) {
                Ok(event) => history.push(event),
                Err(DomainError::UnknownEventType { event_type }) => {
                    tracing::warn!(
                        aggregate_id = %aggregate_id,
                        version = stored.version,
                        event_type = %event_type,
                        "no apply handler for stored event, skipping"
                    );
                }
                Err(other) => return Err(other),
            }
        }
        aggregate.replay(history.iter());
        aggregate.set_version(latest_version);
        Ok(aggregate)
    }

    /// Rehydrates the aggregate, or returns a fresh one at version `-1` when
    /// no history exists. This is the creation-path variant of [`Self::get`].
    ///
    /// # Errors
    ///
    /// Returns a store error when loading or decoding fails.
    pub async fn get_or_new(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        match self.get(aggregate_id).await {
            Err(DomainError::AggregateNotFound(_)) => Ok(A::new(aggregate_id)),
            result => result,
        }
    }

    /// Commits the aggregate's uncommitted events.
    ///
    /// Appends at `expected_version = aggregate.version()`; on success the
    /// aggregate's version advances to the last persisted version and the
    /// uncommitted buffer is cleared. An empty buffer is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates [`DomainError::ConcurrencyConflict`] and other store
    /// errors unchanged; the buffer is left intact so the caller may retry.
    pub async fn save(&self, aggregate: &mut A) -> Result<i64, DomainError> {
        let events: Vec<_> = aggregate.uncommitted_events().iter().map(to_stored).collect();
        if events.is_empty() {
            return Ok(aggregate.version());
        }

        let new_version = self
            .store
            .append(aggregate.aggregate_id(), events, aggregate.version())
            .await?;

        aggregate.set_version(new_version);
        aggregate.clear_uncommitted_events();
        Ok(new_version)
    }
}
