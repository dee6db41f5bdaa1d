//! Read-model projection for the bank-account context.
//!
//! The projection consumes account events from the bus and materializes one
//! `AccountView` per account. Delivery is at-least-once, so application is
//! idempotent on `(aggregate_id, version)`: a delivery at or below the
//! view's last applied version is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use ledgerbank_core::error::DomainError;
use ledgerbank_core::event::DomainEvent;
use ledgerbank_core::repository::StoredEvent;

use crate::domain::events::{AccountEvent, AccountEventKind, AccountType};

/// Read-only view of a bank account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    /// The account identifier.
    pub account_id: Uuid,
    /// The account holder's name.
    pub holder: String,
    /// The kind of account.
    pub account_type: AccountType,
    /// Current balance.
    pub balance: Decimal,
    /// Whether the account is open.
    pub active: bool,
    /// Version of the last event applied to this view.
    pub last_version: i64,
    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
}

/// Repository for account views.
#[async_trait]
pub trait AccountViewRepository: Send + Sync {
    /// Finds one account view.
    async fn find(&self, account_id: Uuid) -> Result<Option<AccountView>, DomainError>;

    /// Returns all account views.
    async fn find_all(&self) -> Result<Vec<AccountView>, DomainError>;

    /// Inserts or replaces a view.
    async fn upsert(&self, view: AccountView) -> Result<(), DomainError>;
}

/// View repository holding the read model in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountViewRepository {
    views: RwLock<HashMap<Uuid, AccountView>>,
}

impl InMemoryAccountViewRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountViewRepository for InMemoryAccountViewRepository {
    async fn find(&self, account_id: Uuid) -> Result<Option<AccountView>, DomainError> {
        Ok(self.views.read().await.get(&account_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<AccountView>, DomainError> {
        let mut views: Vec<AccountView> = self.views.read().await.values().cloned().collect();
        views.sort_by_key(|view| (view.opened_at, view.account_id));
        Ok(views)
    }

    async fn upsert(&self, view: AccountView) -> Result<(), DomainError> {
        self.views.write().await.insert(view.account_id, view);
        Ok(())
    }
}

/// Applies account events to the read model.
pub struct AccountProjection {
    views: Arc<dyn AccountViewRepository>,
}

impl AccountProjection {
    /// Creates a projection over `views`.
    #[must_use]
    pub fn new(views: Arc<dyn AccountViewRepository>) -> Self {
        Self { views }
    }

    /// Applies one delivered event to the read model.
    ///
    /// Unknown event types and duplicate deliveries are logged and skipped;
    /// both leave the read model unchanged.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the view cannot be read or written,
    /// or [`DomainError::Infrastructure`] when a known event's payload is
    /// malformed.
    pub async fn on_event(&self, stored: &StoredEvent) -> Result<(), DomainError> {
        let event = match AccountEvent::from_stored(stored) {
            Ok(event) => event,
            Err(DomainError::UnknownEventType { event_type }) => {
                tracing::warn!(
                    aggregate_id = %stored.aggregate_id,
                    event_type = %event_type,
                    "no projection handler for event, skipping"
                );
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        let account_id = stored.aggregate_id;
        let existing = self.views.find(account_id).await?;
        if let Some(view) = &existing {
            if view.last_version >= stored.version {
                tracing::debug!(
                    account_id = %account_id,
                    version = stored.version,
                    "duplicate delivery, skipping"
                );
                return Ok(());
            }
        }

        let view = match (event.kind, existing) {
            (AccountEventKind::AccountOpened(opened), _) => AccountView {
                account_id,
                holder: opened.holder,
                account_type: opened.account_type,
                balance: opened.opening_balance,
                active: true,
                last_version: stored.version,
                opened_at: opened.opened_at,
            },
            (kind, Some(mut view)) => {
                match kind {
                    AccountEventKind::FundsDeposited(deposited) => {
                        view.balance += deposited.amount;
                    }
                    AccountEventKind::FundsWithdrawn(withdrawn) => {
                        view.balance -= withdrawn.amount;
                    }
                    AccountEventKind::AccountClosed(_) => view.active = false,
                    AccountEventKind::AccountOpened(_) => unreachable!("handled above"),
                }
                view.last_version = stored.version;
                view
            }
            (_, None) => {
                tracing::warn!(
                    account_id = %account_id,
                    version = stored.version,
                    "event for an account with no view yet, skipping"
                );
                return Ok(());
            }
        };

        self.views.upsert(view).await
    }
}
