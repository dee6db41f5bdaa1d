//! Routes for the bank-account context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerbank_account::application::projections::AccountView;
use ledgerbank_account::domain::commands::{
    AccountCommand, CloseAccount, DepositFunds, OpenAccount, WithdrawFunds,
};
use ledgerbank_account::domain::events::AccountType;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    /// The account holder's name.
    pub holder: String,
    /// The kind of account to open.
    pub account_type: AccountType,
    /// The balance the account starts with.
    pub opening_balance: Decimal,
}

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// The amount to move.
    pub amount: Decimal,
}

/// Response carrying the account addressed by a command.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// The account identifier.
    pub account_id: Uuid,
}

/// POST / — open a new account with a server-generated identifier.
async fn open_account(
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account_id = Uuid::new_v4();
    state
        .dispatcher
        .send(AccountCommand::Open(OpenAccount {
            correlation_id: Uuid::new_v4(),
            account_id,
            holder: request.holder,
            account_type: request.account_type,
            opening_balance: request.opening_balance,
        }))
        .await?;
    Ok((StatusCode::CREATED, Json(AccountResponse { account_id })))
}

/// POST /{id}/deposits
async fn deposit_funds(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    state
        .dispatcher
        .send(AccountCommand::Deposit(DepositFunds {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: request.amount,
        }))
        .await?;
    Ok(Json(AccountResponse { account_id }))
}

/// POST /{id}/withdrawals
async fn withdraw_funds(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    state
        .dispatcher
        .send(AccountCommand::Withdraw(WithdrawFunds {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: request.amount,
        }))
        .await?;
    Ok(Json(AccountResponse { account_id }))
}

/// POST /{id}/close
async fn close_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    state
        .dispatcher
        .send(AccountCommand::Close(CloseAccount {
            correlation_id: Uuid::new_v4(),
            account_id,
        }))
        .await?;
    Ok(Json(AccountResponse { account_id }))
}

/// GET /{id} — the account's read-model view.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ApiError> {
    let view = state.queries.find_account(account_id).await?;
    Ok(Json(view))
}

/// GET / — every account view.
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountView>>, ApiError> {
    let views = state.queries.list_accounts().await?;
    Ok(Json(views))
}

/// Returns the router for the bank-account context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_account).get(list_accounts))
        .route("/{id}", get(get_account))
        .route("/{id}/deposits", post(deposit_funds))
        .route("/{id}/withdrawals", post(withdraw_funds))
        .route("/{id}/close", post(close_account))
}
