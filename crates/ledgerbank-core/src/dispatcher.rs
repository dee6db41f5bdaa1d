//! In-process command dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{Command, CommandHandler};
use crate::error::DomainError;

/// Routes a command to the single handler registered for its type.
///
/// The routing table holds a list per command type so that registration
/// never fails; `send` rejects any type with more than one handler. The
/// table is populated at startup and read-only afterwards.
pub struct CommandDispatcher<C: Command> {
    routes: HashMap<&'static str, Vec<Arc<dyn CommandHandler<C>>>>,
}

impl<C: Command> CommandDispatcher<C> {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Adds `handler` to the list registered for `command_type`.
    pub fn register(&mut self, command_type: &'static str, handler: Arc<dyn CommandHandler<C>>) {
        self.routes.entry(command_type).or_default().push(handler);
    }

    /// Dispatches the command to its registered handler.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HandlerMissing`] when no handler is registered
    /// for the command's type, [`DomainError::HandlerAmbiguous`] when more
    /// than one is, and otherwise whatever the handler returns.
    pub async fn send(&self, command: C) -> Result<(), DomainError> {
        let command_type = command.command_type();
        match self.routes.get(command_type).map(Vec::as_slice) {
            None | Some([]) => Err(DomainError::HandlerMissing {
                command_type: command_type.to_owned(),
            }),
            Some([handler]) => handler.handle(command).await,
            Some(handlers) => Err(DomainError::HandlerAmbiguous {
                command_type: command_type.to_owned(),
                count: handlers.len(),
            }),
        }
    }
}

impl<C: Command> Default for CommandDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}
