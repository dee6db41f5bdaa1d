//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict on append.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected latest version.
        expected: i64,
        /// The actual latest version found.
        actual: i64,
    },

    /// A domain rule violation: the command's preconditions failed.
    #[error("domain rule violation: {0}")]
    Validation(String),

    /// No handler registered for a command type.
    #[error("no command handler registered for {command_type}")]
    HandlerMissing {
        /// The command type that had no handler.
        command_type: String,
    },

    /// More than one handler registered for a command type.
    #[error("{count} command handlers registered for {command_type}, expected exactly one")]
    HandlerAmbiguous {
        /// The command type with conflicting registrations.
        command_type: String,
        /// How many handlers were registered.
        count: usize,
    },

    /// Publishing an event to the bus failed.
    #[error("publish to topic {topic} failed: {reason}")]
    PublishFailed {
        /// The topic the publish was addressed to.
        topic: String,
        /// The underlying failure.
        reason: String,
    },

    /// A stored event carries a type discriminator no aggregate understands.
    #[error("unknown event type: {event_type}")]
    UnknownEventType {
        /// The unrecognized discriminator.
        event_type: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
