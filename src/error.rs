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

//! Error types for account and transfer operations.

use crate::AccountId;
use thiserror::Error;

/// Ledger operation errors.
///
/// Every variant is recoverable and leaves all balances untouched, so a
/// caller may retry immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Account id is empty
    #[error("account id must not be empty")]
    InvalidAccountId,

    /// Initial balance is negative
    #[error("invalid balance (must not be negative)")]
    InvalidBalance,

    /// Transfer amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// An account with this id already exists
    #[error("account id {0} already exists")]
    DuplicateAccountId(AccountId),

    /// No account with this id
    #[error("account id {0} does not exist")]
    AccountNotFound(AccountId),

    /// Debit would drive the balance below zero
    #[error("insufficient balance in account {0}")]
    InsufficientBalance(AccountId),

    /// The account lock could not be acquired in time
    #[error("timed out waiting for lock on account {0}")]
    LockTimeout(AccountId),

    /// Credit would exceed the representable decimal range
    #[error("balance overflow in account {0}")]
    BalanceOverflow(AccountId),
}

impl LedgerError {
    /// Stable machine-readable code, distinct per variant.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAccountId => "INVALID_ACCOUNT_ID",
            LedgerError::InvalidBalance => "INVALID_BALANCE",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::DuplicateAccountId(_) => "DUPLICATE_ACCOUNT_ID",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            LedgerError::LockTimeout(_) => "LOCK_TIMEOUT",
            LedgerError::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }
}

/// Failure to deliver a best-effort notification.
///
/// Never converted into [`LedgerError`]; a failed notice does not fail the
/// transfer it reports on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The delivery channel is closed
    #[error("notification channel closed")]
    Closed,

    /// Too many notices are waiting for delivery
    #[error("notification queue full")]
    QueueFull,

    /// The notifier rejected the message
    #[error("notification rejected: {0}")]
    Rejected(String),
}
