// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! REST API over the ledger.
//!
//! ```bash
//! # Create an account
//! curl -X POST http://localhost:3000/v1/accounts \
//!   -H "Content-Type: application/json" \
//!   -d '{"accountId": "Id-123", "balance": 1000}'
//!
//! # Get an account
//! curl http://localhost:3000/v1/accounts/Id-123
//!
//! # List all accounts
//! curl http://localhost:3000/v1/accounts
//!
//! # Transfer
//! curl -X PUT http://localhost:3000/v1/accounts/amounttransfer \
//!   -H "Content-Type: application/json" \
//!   -d '{"fromAccountId": "Id-123", "toAccountId": "Id-456", "amountToTransfer": 50}'
//! ```

use crate::account::AccountView;
use crate::{AccountId, Ledger, LedgerError};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// === Request/Response DTOs ===

/// Body of `POST /v1/accounts`. Fields stay optional so that missing values
/// are reported with a specific error code instead of a generic parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub account_id: Option<String>,
    /// JSON numbers are read digit for digit, never through `f64`.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub balance: Option<Decimal>,
}

/// Body of `PUT /v1/accounts/amounttransfer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: Option<String>,
    pub to_account_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub amount_to_transfer: Option<Decimal>,
}

/// Validated account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccount {
    pub id: AccountId,
    pub balance: Decimal,
}

/// Validated transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from_id: AccountId,
    pub to_id: AccountId,
    pub amount: Decimal,
}

fn required_id(id: Option<String>) -> Result<AccountId, LedgerError> {
    AccountId::new(id.ok_or(LedgerError::InvalidAccountId)?)
}

impl CreateAccountRequest {
    pub fn validate(self) -> Result<CreateAccount, LedgerError> {
        let id = required_id(self.account_id)?;
        let balance = match self.balance {
            Some(balance) if balance >= Decimal::ZERO => balance,
            _ => return Err(LedgerError::InvalidBalance),
        };
        Ok(CreateAccount { id, balance })
    }
}

impl TransferRequest {
    pub fn validate(self) -> Result<Transfer, LedgerError> {
        let from_id = required_id(self.from_account_id)?;
        let to_id = required_id(self.to_account_id)?;
        let amount = match self.amount_to_transfer {
            Some(amount) if amount > Decimal::ZERO => amount,
            _ => return Err(LedgerError::InvalidAmount),
        };
        Ok(Transfer {
            from_id,
            to_id,
            amount,
        })
    }
}

/// Response body for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

// === Error Handling ===

/// Errors surfaced by handlers.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    /// Body missing, not JSON, or not the expected shape
    Malformed(String),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

/// HTTP status for each ledger error.
pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAccountId
        | LedgerError::InvalidBalance
        | LedgerError::InvalidAmount => StatusCode::BAD_REQUEST,
        LedgerError::DuplicateAccountId(_) => StatusCode::CONFLICT,
        LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InsufficientBalance(_) => StatusCode::FORBIDDEN,
        LedgerError::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::BalanceOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Ledger(err) => (status_for(&err), err.code(), err.to_string()),
            ApiError::Malformed(message) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// Runs ledger work that may wait on account locks off the async workers.
async fn run_blocking<T, F>(ledger: &Arc<Ledger>, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&Ledger) -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    let ledger = Arc::clone(ledger);
    tokio::task::spawn_blocking(move || work(&ledger))
        .await
        .map_err(|e| {
            error!(error = %e, "ledger task failed");
            ApiError::Internal("request could not be completed".to_string())
        })?
        .map_err(ApiError::from)
}

/// POST /v1/accounts - Create an account.
async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let command = request.validate()?;
    info!(account_id = %command.id, balance = %command.balance, "creating account");

    // Registry only; never touches an account lock.
    state.ledger.store().create(command.id, command.balance)?;
    Ok(StatusCode::CREATED)
}

/// GET /v1/accounts/{account_id} - Get an account.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountView>, ApiError> {
    info!(%account_id, "retrieving account");
    run_blocking(&state.ledger, move |ledger| ledger.get_account(&account_id))
        .await
        .map(Json)
}

/// GET /v1/accounts - List all accounts.
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountView>>, ApiError> {
    run_blocking(&state.ledger, Ledger::accounts).await.map(Json)
}

/// PUT /v1/accounts/amounttransfer - Move funds between two accounts.
async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let command = request.validate()?;
    info!(
        from = %command.from_id,
        to = %command.to_id,
        amount = %command.amount,
        "transferring amount"
    );

    run_blocking(&state.ledger, move |ledger| {
        ledger.transfer(command.from_id.as_str(), command.to_id.as_str(), command.amount)
    })
    .await?;

    Ok(StatusCode::ACCEPTED)
}

// === Router ===

pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/v1/accounts", post(create_account).get(list_accounts))
        .route("/v1/accounts/amounttransfer", put(transfer))
        .route("/v1/accounts/{account_id}", get(get_account))
        .with_state(AppState { ledger })
}
