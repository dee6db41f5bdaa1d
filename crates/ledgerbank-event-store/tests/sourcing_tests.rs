//! Tests for `EventSourcingHandler`: rehydration, round-trips, and
//! conflict propagation, exercised against a small ledger aggregate.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerbank_core::aggregate::AggregateRoot;
use ledgerbank_core::error::DomainError;
use ledgerbank_core::event::{DomainEvent, EventMetadata};
use ledgerbank_core::repository::StoredEvent;
use ledgerbank_event_store::{EventSourcingHandler, EventStore, InMemoryEventRepository};
use ledgerbank_test_support::RecordingEventBus;

const LEDGER_CREDITED: &str = "ledger.credited";
const LEDGER_DEBITED: &str = "ledger.debited";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Credited {
    ledger_id: Uuid,
    amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Debited {
    ledger_id: Uuid,
    amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum LedgerEventKind {
    Credited(Credited),
    Debited(Debited),
}

#[derive(Debug, Clone)]
struct LedgerEvent {
    metadata: EventMetadata,
    kind: LedgerEventKind,
}

impl DomainEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            LedgerEventKind::Credited(_) => LEDGER_CREDITED,
            LedgerEventKind::Debited(_) => LEDGER_DEBITED,
        }
    }

    fn aggregate_type() -> &'static str {
        "ledger.test"
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).expect("LedgerEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        match stored.event_type.as_str() {
            LEDGER_CREDITED | LEDGER_DEBITED => {}
            other => {
                return Err(DomainError::UnknownEventType {
                    event_type: other.to_owned(),
                });
            }
        }
        let kind: LedgerEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|err| DomainError::Infrastructure(err.to_string()))?;
        Ok(Self {
            metadata: EventMetadata {
                event_id: stored.event_id,
                aggregate_id: stored.aggregate_id,
                version: stored.version,
                correlation_id: stored.correlation_id,
                causation_id: stored.causation_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        })
    }
}

#[derive(Debug)]
struct Ledger {
    id: Uuid,
    version: i64,
    total: i64,
    uncommitted_events: Vec<LedgerEvent>,
}

impl Ledger {
    fn credit(&mut self, amount: i64) {
        let kind = LedgerEventKind::Credited(Credited {
            ledger_id: self.id,
            amount,
        });
        self.raise(self.event(kind));
    }

    fn debit(&mut self, amount: i64) {
        let kind = LedgerEventKind::Debited(Debited {
            ledger_id: self.id,
            amount,
        });
        self.raise(self.event(kind));
    }

    fn event(&self, kind: LedgerEventKind) -> LedgerEvent {
        let correlation_id = Uuid::new_v4();
        LedgerEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                aggregate_id: self.id,
                version: -1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            },
            kind,
        }
    }
}

impl AggregateRoot for Ledger {
    type Event = LedgerEvent;

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
        match &event.kind {
            LedgerEventKind::Credited(credited) => self.total += credited.amount,
            LedgerEventKind::Debited(debited) => self.total -= debited.amount,
        }
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

fn handler() -> (Arc<EventStore>, EventSourcingHandler<Ledger>) {
    let repository = Arc::new(InMemoryEventRepository::new());
    let bus = Arc::new(RecordingEventBus::new());
    let store = Arc::new(EventStore::new(repository, bus));
    (store.clone(), EventSourcingHandler::new(store))
}

#[tokio::test]
async fn test_save_then_get_round_trips_state_and_version() {
    // Arrange
    let (_store, handler) = handler();
    let ledger_id = Uuid::new_v4();
    let mut ledger = Ledger::new(ledger_id);
    ledger.credit(200);
    ledger.debit(50);

    // Act
    let new_version = handler.save(&mut ledger).await.unwrap();
    let reloaded = handler.get(ledger_id).await.unwrap();

    // Assert
    assert_eq!(new_version, 1);
    assert_eq!(ledger.version(), 1);
    assert!(ledger.uncommitted_events().is_empty());
    assert_eq!(reloaded.total, 150);
    assert_eq!(reloaded.version(), 1);
    assert!(reloaded.uncommitted_events().is_empty());
}

#[tokio::test]
async fn test_get_without_history_is_not_found() {
    let (_store, handler) = handler();
    let ledger_id = Uuid::new_v4();

    let result = handler.get(ledger_id).await;

    match result.unwrap_err() {
        DomainError::AggregateNotFound(id) => assert_eq!(id, ledger_id),
        other => panic!("expected AggregateNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_or_new_yields_fresh_aggregate_without_history() {
    let (_store, handler) = handler();
    let ledger_id = Uuid::new_v4();

    let ledger = handler.get_or_new(ledger_id).await.unwrap();

    assert_eq!(ledger.aggregate_id(), ledger_id);
    assert_eq!(ledger.version(), -1);
    assert_eq!(ledger.total, 0);
    assert!(ledger.uncommitted_events().is_empty());
}

#[tokio::test]
async fn test_save_with_empty_buffer_is_a_noop() {
    let (_store, handler) = handler();
    let mut ledger = Ledger::new(Uuid::new_v4());

    let version = handler.save(&mut ledger).await.unwrap();

    assert_eq!(version, -1);
}

#[tokio::test]
async fn test_unknown_event_types_are_skipped_but_still_count_for_version() {
    // Arrange: two understood events with a foreign record wedged between.
    let (store, handler) = handler();
    let ledger_id = Uuid::new_v4();
    let mut ledger = Ledger::new(ledger_id);
    ledger.credit(100);
    handler.save(&mut ledger).await.unwrap();

    let foreign = StoredEvent {
        event_id: Uuid::new_v4(),
        aggregate_id: ledger_id,
        aggregate_type: "ledger.test".to_owned(),
        event_type: "ledger.revalued".to_owned(),
        payload: serde_json::json!({ "rate": 2 }),
        version: -1,
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    };
    store.append(ledger_id, vec![foreign], 0).await.unwrap();

    let mut ledger = handler.get(ledger_id).await.unwrap();
    ledger.credit(10);
    handler.save(&mut ledger).await.unwrap();

    // Act
    let reloaded = handler.get(ledger_id).await.unwrap();

    // Assert: the foreign event contributed nothing to state but holds its
    // slot in the stream.
    assert_eq!(reloaded.total, 110);
    assert_eq!(reloaded.version(), 2);
}

#[tokio::test]
async fn test_conflicting_save_propagates_and_retry_succeeds() {
    // Arrange: two sessions rehydrate the same ledger at version 0.
    let (_store, handler) = handler();
    let ledger_id = Uuid::new_v4();
    let mut seed = Ledger::new(ledger_id);
    seed.credit(10);
    handler.save(&mut seed).await.unwrap();

    let mut winner = handler.get(ledger_id).await.unwrap();
    let mut loser = handler.get(ledger_id).await.unwrap();
    winner.credit(5);
    loser.credit(5);

    // Act
    handler.save(&mut winner).await.unwrap();
    let conflict = handler.save(&mut loser).await;

    // Assert
    assert!(matches!(
        conflict.unwrap_err(),
        DomainError::ConcurrencyConflict { .. }
    ));

    // The loser retries the whole command: reload, re-validate, re-emit.
    let mut retried = handler.get(ledger_id).await.unwrap();
    retried.credit(5);
    handler.save(&mut retried).await.unwrap();

    let reloaded = handler.get(ledger_id).await.unwrap();
    assert_eq!(reloaded.total, 20);
    assert_eq!(reloaded.version(), 2);
}
