//! In-memory implementation of the `EventRepository` trait.
//!
//! Supports tests and local development without a database while enforcing
//! the same contract as the durable adapter: a compare-and-swap on the
//! stream's latest version and uniqueness of `(aggregate_id, version)`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::{EventRepository, StoredEvent};

/// Event repository holding streams in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self.streams.read().await;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();
        let actual = stream.last().map_or(-1, |event| event.version);

        if expected_version != -1 && actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        // Unique (aggregate_id, version), as the durable index would enforce.
        for event in events {
            if stream.iter().any(|existing| existing.version == event.version) {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    expected: expected_version,
                    actual,
                });
            }
        }

        stream.extend_from_slice(events);
        Ok(())
    }
}
