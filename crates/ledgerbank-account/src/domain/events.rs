//! Domain events for the bank-account context.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerbank_core::error::DomainError;
use ledgerbank_core::event::{DomainEvent, EventMetadata};
use ledgerbank_core::repository::StoredEvent;

/// Event type discriminator for [`AccountOpened`]; doubles as its bus topic.
pub const ACCOUNT_OPENED: &str = "account.account_opened";
/// Event type discriminator for [`FundsDeposited`]; doubles as its bus topic.
pub const FUNDS_DEPOSITED: &str = "account.funds_deposited";
/// Event type discriminator for [`FundsWithdrawn`]; doubles as its bus topic.
pub const FUNDS_WITHDRAWN: &str = "account.funds_withdrawn";
/// Event type discriminator for [`AccountClosed`]; doubles as its bus topic.
pub const ACCOUNT_CLOSED: &str = "account.account_closed";

/// Every topic the bank-account context publishes on.
pub const ACCOUNT_TOPICS: [&str; 4] = [
    ACCOUNT_OPENED,
    FUNDS_DEPOSITED,
    FUNDS_WITHDRAWN,
    ACCOUNT_CLOSED,
];

/// The kind of account held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// A checking account.
    Checking,
    /// A savings account.
    Savings,
}

/// Emitted when an account is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOpened {
    /// The account identifier.
    pub account_id: Uuid,
    /// The account holder's name.
    pub holder: String,
    /// The kind of account opened.
    pub account_type: AccountType,
    /// The balance the account starts with.
    pub opening_balance: Decimal,
    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
}

/// Emitted when funds are deposited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsDeposited {
    /// The account identifier.
    pub account_id: Uuid,
    /// The deposited amount.
    pub amount: Decimal,
}

/// Emitted when funds are withdrawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    /// The account identifier.
    pub account_id: Uuid,
    /// The withdrawn amount.
    pub amount: Decimal,
}

/// Emitted when an account is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountClosed {
    /// The account identifier.
    pub account_id: Uuid,
}

/// Event payload variants for the bank-account context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountEventKind {
    /// An account has been opened.
    AccountOpened(AccountOpened),
    /// Funds have been deposited.
    FundsDeposited(FundsDeposited),
    /// Funds have been withdrawn.
    FundsWithdrawn(FundsWithdrawn),
    /// An account has been closed.
    AccountClosed(AccountClosed),
}

/// Domain event envelope for the bank-account context.
#[derive(Debug, Clone)]
pub struct AccountEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: AccountEventKind,
}

impl AccountEvent {
    /// Builds a fresh event caused by `correlation_id`, occurring at
    /// `occurred_at`. The version stays `-1` until the store numbers the
    /// event on append.
    #[must_use]
    pub fn new(
        aggregate_id: Uuid,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
        kind: AccountEventKind,
    ) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                aggregate_id,
                version: -1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at,
            },
            kind,
        }
    }
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            AccountEventKind::AccountOpened(_) => ACCOUNT_OPENED,
            AccountEventKind::FundsDeposited(_) => FUNDS_DEPOSITED,
            AccountEventKind::FundsWithdrawn(_) => FUNDS_WITHDRAWN,
            AccountEventKind::AccountClosed(_) => ACCOUNT_CLOSED,
        }
    }

    fn aggregate_type() -> &'static str {
        "account.bank_account"
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("AccountEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        match stored.event_type.as_str() {
            ACCOUNT_OPENED | FUNDS_DEPOSITED | FUNDS_WITHDRAWN | ACCOUNT_CLOSED => {}
            other => {
                return Err(DomainError::UnknownEventType {
                    event_type: other.to_owned(),
                });
            }
        }
        let kind: AccountEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|err| DomainError::Infrastructure(format!("malformed event payload: {err}")))?;
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
