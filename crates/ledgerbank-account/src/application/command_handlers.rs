//! Command handlers for the bank-account context.
//!
//! One handler serves all account commands: it rehydrates the aggregate,
//! executes the command against it, and commits the resulting events. It is
//! registered with the dispatcher once per command type.

use std::sync::Arc;

use async_trait::async_trait;

use ledgerbank_core::clock::Clock;
use ledgerbank_core::command::CommandHandler;
use ledgerbank_core::dispatcher::CommandDispatcher;
use ledgerbank_core::error::DomainError;
use ledgerbank_event_store::EventSourcingHandler;

use crate::domain::aggregates::BankAccount;
use crate::domain::commands::{
    AccountCommand, CLOSE_ACCOUNT, CloseAccount, DEPOSIT_FUNDS, DepositFunds, OPEN_ACCOUNT,
    OpenAccount, WITHDRAW_FUNDS, WithdrawFunds,
};

/// Handles every command of the bank-account context.
pub struct AccountCommandHandler {
    accounts: Arc<EventSourcingHandler<BankAccount>>,
    clock: Arc<dyn Clock>,
}

impl AccountCommandHandler {
    /// Creates a handler over the account repository.
    #[must_use]
    pub fn new(accounts: Arc<EventSourcingHandler<BankAccount>>, clock: Arc<dyn Clock>) -> Self {
        Self { accounts, clock }
    }

    /// Registers `handler` with the dispatcher for every account command
    /// type.
    pub fn register(handler: &Arc<Self>, dispatcher: &mut CommandDispatcher<AccountCommand>) {
        for command_type in [OPEN_ACCOUNT, DEPOSIT_FUNDS, WITHDRAW_FUNDS, CLOSE_ACCOUNT] {
            dispatcher.register(command_type, handler.clone());
        }
    }

    async fn handle_open(&self, command: OpenAccount) -> Result<(), DomainError> {
        let mut account = self.accounts.get_or_new(command.account_id).await?;
        account.open(
            command.holder,
            command.account_type,
            command.opening_balance,
            command.correlation_id,
            self.clock.as_ref(),
        )?;
        self.accounts.save(&mut account).await?;
        Ok(())
    }

    async fn handle_deposit(&self, command: DepositFunds) -> Result<(), DomainError> {
        let mut account = self.accounts.get(command.account_id).await?;
        account.deposit(command.amount, command.correlation_id, self.clock.as_ref())?;
        self.accounts.save(&mut account).await?;
        Ok(())
    }

    async fn handle_withdraw(&self, command: WithdrawFunds) -> Result<(), DomainError> {
        let mut account = self.accounts.get(command.account_id).await?;
        account.withdraw(command.amount, command.correlation_id, self.clock.as_ref())?;
        self.accounts.save(&mut account).await?;
        Ok(())
    }

    async fn handle_close(&self, command: CloseAccount) -> Result<(), DomainError> {
        let mut account = self.accounts.get(command.account_id).await?;
        account.close(command.correlation_id, self.clock.as_ref())?;
        self.accounts.save(&mut account).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<AccountCommand> for AccountCommandHandler {
    async fn handle(&self, command: AccountCommand) -> Result<(), DomainError> {
        match command {
            AccountCommand::Open(command) => self.handle_open(command).await,
            AccountCommand::Deposit(command) => self.handle_deposit(command).await,
            AccountCommand::Withdraw(command) => self.handle_withdraw(command).await,
            AccountCommand::Close(command) => self.handle_close(command).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::AccountCommandHandler;
    use crate::domain::commands::{AccountCommand, DepositFunds, OpenAccount};
    use crate::domain::events::{ACCOUNT_OPENED, AccountType};
    use ledgerbank_core::command::CommandHandler;
    use ledgerbank_core::error::DomainError;
    use ledgerbank_event_store::{EventSourcingHandler, EventStore, InMemoryEventRepository};
    use ledgerbank_test_support::{FixedClock, RecordingEventBus};

    fn handler() -> Arc<AccountCommandHandler> {
        let repository = Arc::new(InMemoryEventRepository::new());
        let bus = Arc::new(RecordingEventBus::new());
        let store = Arc::new(EventStore::new(repository, bus));
        let accounts = Arc::new(EventSourcingHandler::new(store));
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        Arc::new(AccountCommandHandler::new(accounts, clock))
    }

    fn amount(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_persists_an_account_opened_event() {
        // Arrange
        let repository = Arc::new(InMemoryEventRepository::new());
        let bus = Arc::new(RecordingEventBus::new());
        let store = Arc::new(EventStore::new(repository, bus.clone()));
        let accounts = Arc::new(EventSourcingHandler::new(store));
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let handler = AccountCommandHandler::new(accounts, clock);
        let account_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        // Act
        handler
            .handle(AccountCommand::Open(OpenAccount {
                correlation_id,
                account_id,
                holder: "Ada Lovelace".to_owned(),
                account_type: AccountType::Checking,
                opening_balance: amount("100"),
            }))
            .await
            .unwrap();

        // Assert
        let published = bus.published();
        assert_eq!(published.len(), 1);
        let (topic, stored) = &published[0];
        assert_eq!(topic, ACCOUNT_OPENED);
        assert_eq!(stored.aggregate_id, account_id);
        assert_eq!(stored.version, 0);
        assert_eq!(stored.correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn test_deposit_into_unknown_account_is_not_found() {
        let handler = handler();
        let account_id = Uuid::new_v4();

        let result = handler
            .handle(AccountCommand::Deposit(DepositFunds {
                correlation_id: Uuid::new_v4(),
                account_id,
                amount: amount("10"),
            }))
            .await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, account_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_opening_the_same_account_twice_is_rejected() {
        let handler = handler();
        let account_id = Uuid::new_v4();
        let open = AccountCommand::Open(OpenAccount {
            correlation_id: Uuid::new_v4(),
            account_id,
            holder: "Ada Lovelace".to_owned(),
            account_type: AccountType::Savings,
            opening_balance: amount("25"),
        });

        handler.handle(open.clone()).await.unwrap();
        let result = handler.handle(open).await;

        assert!(matches!(result.unwrap_err(), DomainError::Validation(_)));
    }
}
