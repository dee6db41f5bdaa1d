//! Command abstractions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type discriminator for this command (dispatcher routing key).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}

/// A handler for commands of type `C`.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Validates and executes the command.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the command's preconditions
    /// fail, or a store error when persistence fails.
    async fn handle(&self, command: C) -> Result<(), DomainError>;
}
