//! The bank-account aggregate root.

use rust_decimal::Decimal;
use uuid::Uuid;

use ledgerbank_core::aggregate::AggregateRoot;
use ledgerbank_core::clock::Clock;
use ledgerbank_core::error::DomainError;

use super::events::{
    AccountClosed, AccountEvent, AccountEventKind, AccountOpened, AccountType, FundsDeposited,
    FundsWithdrawn,
};

/// The aggregate root for a bank account.
///
/// A fresh instance is inert (`active = false`, version `-1`) until an
/// `AccountOpened` event is applied, either by the open command or by
/// replaying history.
#[derive(Debug)]
pub struct BankAccount {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Version of the last persisted event, or `-1`.
    pub version: i64,
    /// Whether the account is open.
    pub active: bool,
    /// Current balance.
    pub balance: Decimal,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<AccountEvent>,
}

impl BankAccount {
    /// Opens the account. Creation only: fails once the account has any
    /// history or buffered events.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the account already exists.
    pub fn open(
        &mut self,
        holder: String,
        account_type: AccountType,
        opening_balance: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.version != -1 || self.active || !self.uncommitted_events.is_empty() {
            return Err(DomainError::Validation(
                "the account has already been opened".into(),
            ));
        }

        let opened_at = clock.now();
        self.raise(AccountEvent::new(
            self.id,
            correlation_id,
            opened_at,
            AccountEventKind::AccountOpened(AccountOpened {
                account_id: self.id,
                holder,
                account_type,
                opening_balance,
                opened_at,
            }),
        ));
        Ok(())
    }

    /// Deposits `amount` into the account.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the account is closed or the
    /// amount is not positive.
    pub fn deposit(
        &mut self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::Validation(
                "funds cannot be deposited into a closed account".into(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "the deposit amount must be greater than zero".into(),
            ));
        }

        self.raise(AccountEvent::new(
            self.id,
            correlation_id,
            clock.now(),
            AccountEventKind::FundsDeposited(FundsDeposited {
                account_id: self.id,
                amount,
            }),
        ));
        Ok(())
    }

    /// Withdraws `amount` from the account. The balance may go negative;
    /// overdrafts are not a domain rule here.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the account is closed.
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::Validation(
                "funds cannot be withdrawn from a closed account".into(),
            ));
        }

        self.raise(AccountEvent::new(
            self.id,
            correlation_id,
            clock.now(),
            AccountEventKind::FundsWithdrawn(FundsWithdrawn {
                account_id: self.id,
                amount,
            }),
        ));
        Ok(())
    }

    /// Closes the account.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the account is already
    /// closed.
    pub fn close(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::Validation(
                "the account has already been closed".into(),
            ));
        }

        self.raise(AccountEvent::new(
            self.id,
            correlation_id,
            clock.now(),
            AccountEventKind::AccountClosed(AccountClosed {
                account_id: self.id,
            }),
        ));
        Ok(())
    }
}

impl AggregateRoot for BankAccount {
    type Event = AccountEvent;

    fn new(id: Uuid) -> Self {
        Self {
            id,
            version: -1,
            active: false,
            balance: Decimal::ZERO,
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
            AccountEventKind::AccountOpened(opened) => {
                self.id = opened.account_id;
                self.active = true;
                self.balance = opened.opening_balance;
            }
            AccountEventKind::FundsDeposited(deposited) => {
                self.balance += deposited.amount;
            }
            AccountEventKind::FundsWithdrawn(withdrawn) => {
                self.balance -= withdrawn.amount;
            }
            AccountEventKind::AccountClosed(_) => {
                self.active = false;
            }
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
