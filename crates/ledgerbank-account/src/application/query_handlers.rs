//! Query handlers for the bank-account context.

use std::sync::Arc;

use uuid::Uuid;

use ledgerbank_core::error::DomainError;

use crate::application::projections::{AccountView, AccountViewRepository};

/// Serves account queries from the read model.
pub struct AccountQueryHandler {
    views: Arc<dyn AccountViewRepository>,
}

impl AccountQueryHandler {
    /// Creates a query handler over `views`.
    #[must_use]
    pub fn new(views: Arc<dyn AccountViewRepository>) -> Self {
        Self { views }
    }

    /// Finds one account view.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AggregateNotFound`] when no view exists for
    /// the account.
    pub async fn find_account(&self, account_id: Uuid) -> Result<AccountView, DomainError> {
        self.views
            .find(account_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(account_id))
    }

    /// Lists every account view, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the read model cannot be read.
    pub async fn list_accounts(&self) -> Result<Vec<AccountView>, DomainError> {
        self.views.find_all().await
    }
}
