//! Shared application state.

use std::sync::Arc;

use ledgerbank_account::application::query_handlers::AccountQueryHandler;
use ledgerbank_account::domain::commands::AccountCommand;
use ledgerbank_core::dispatcher::CommandDispatcher;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Routes commands to their registered handlers.
    pub dispatcher: Arc<CommandDispatcher<AccountCommand>>,
    /// Serves queries from the account read model.
    pub queries: Arc<AccountQueryHandler>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        dispatcher: Arc<CommandDispatcher<AccountCommand>>,
        queries: Arc<AccountQueryHandler>,
    ) -> Self {
        Self {
            dispatcher,
            queries,
        }
    }
}
