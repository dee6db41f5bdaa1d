//! Commands for the bank-account context.

use rust_decimal::Decimal;
use uuid::Uuid;

use ledgerbank_core::command::Command;

use super::events::AccountType;

/// Command type discriminator for [`OpenAccount`].
pub const OPEN_ACCOUNT: &str = "account.open_account";
/// Command type discriminator for [`DepositFunds`].
pub const DEPOSIT_FUNDS: &str = "account.deposit_funds";
/// Command type discriminator for [`WithdrawFunds`].
pub const WITHDRAW_FUNDS: &str = "account.withdraw_funds";
/// Command type discriminator for [`CloseAccount`].
pub const CLOSE_ACCOUNT: &str = "account.close_account";

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The identifier of the account to open.
    pub account_id: Uuid,
    /// The account holder's name.
    pub holder: String,
    /// The kind of account to open.
    pub account_type: AccountType,
    /// The balance the account starts with.
    pub opening_balance: Decimal,
}

/// Command to deposit funds into an account.
#[derive(Debug, Clone)]
pub struct DepositFunds {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target account.
    pub account_id: Uuid,
    /// The amount to deposit.
    pub amount: Decimal,
}

/// Command to withdraw funds from an account.
#[derive(Debug, Clone)]
pub struct WithdrawFunds {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target account.
    pub account_id: Uuid,
    /// The amount to withdraw.
    pub amount: Decimal,
}

/// Command to close an account.
#[derive(Debug, Clone)]
pub struct CloseAccount {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account to close.
    pub account_id: Uuid,
}

/// All commands of the bank-account context.
#[derive(Debug, Clone)]
pub enum AccountCommand {
    /// Open a new account.
    Open(OpenAccount),
    /// Deposit funds.
    Deposit(DepositFunds),
    /// Withdraw funds.
    Withdraw(WithdrawFunds),
    /// Close an account.
    Close(CloseAccount),
}

impl AccountCommand {
    /// The account the command addresses.
    #[must_use]
    pub fn account_id(&self) -> Uuid {
        match self {
            Self::Open(command) => command.account_id,
            Self::Deposit(command) => command.account_id,
            Self::Withdraw(command) => command.account_id,
            Self::Close(command) => command.account_id,
        }
    }
}

impl Command for AccountCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::Open(_) => OPEN_ACCOUNT,
            Self::Deposit(_) => DEPOSIT_FUNDS,
            Self::Withdraw(_) => WITHDRAW_FUNDS,
            Self::Close(_) => CLOSE_ACCOUNT,
        }
    }

    fn correlation_id(&self) -> Uuid {
        match self {
            Self::Open(command) => command.correlation_id,
            Self::Deposit(command) => command.correlation_id,
            Self::Withdraw(command) => command.correlation_id,
            Self::Close(command) => command.correlation_id,
        }
    }
}
