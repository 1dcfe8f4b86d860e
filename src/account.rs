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

//! Account entity and its per-account lock.
//!
//! Each [`Account`] owns a mutex around its balance for its whole lifetime.
//! Handles are shared as `Arc<Account>` out of the
//! [`AccountStore`](crate::AccountStore); the balance is only read or written
//! through that mutex.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use ledger_transfer_rs::{AccountId, AccountStore};
//! use std::time::Duration;
//!
//! let store = AccountStore::new();
//! store.create(AccountId::new("Id-1").unwrap(), dec!(10.50)).unwrap();
//!
//! let account = store.get("Id-1").unwrap();
//! let view = account.snapshot(Duration::from_millis(100)).unwrap();
//! assert_eq!(view.balance, dec!(10.50));
//! ```

use crate::{AccountId, LedgerError};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct AccountData {
    balance: Decimal,
}

impl AccountData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    inner: Mutex<AccountData>,
}

impl Account {
    pub(crate) fn new(id: AccountId, balance: Decimal) -> Self {
        let data = AccountData { balance };
        data.assert_invariants();
        Self {
            id,
            inner: Mutex::new(data),
        }
    }

    /// The id never changes, so it is readable without the lock.
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Point-in-time snapshot taken under the account lock.
    ///
    /// # Errors
    ///
    /// [`LedgerError::LockTimeout`] if the lock is not acquired within `timeout`.
    pub fn snapshot(&self, timeout: Duration) -> Result<AccountView, LedgerError> {
        self.lock_for(timeout).map(|guard| guard.view())
    }

    /// Acquires the account lock, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::LockTimeout`] if the lock is still held elsewhere when
    /// the timeout elapses.
    pub fn lock_for(&self, timeout: Duration) -> Result<AccountGuard<'_>, LedgerError> {
        self.inner
            .try_lock_for(timeout)
            .map(|data| AccountGuard { id: &self.id, data })
            .ok_or_else(|| LedgerError::LockTimeout(self.id.clone()))
    }
}

/// Exclusive access to one account's balance. The lock is released on drop.
pub struct AccountGuard<'a> {
    id: &'a AccountId,
    data: MutexGuard<'a, AccountData>,
}

impl AccountGuard<'_> {
    pub fn id(&self) -> &AccountId {
        self.id
    }

    pub fn balance(&self) -> Decimal {
        self.data.balance
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            account_id: self.id.clone(),
            balance: self.data.balance,
        }
    }

    /// Fails with [`LedgerError::InsufficientBalance`] if `amount` exceeds the balance.
    pub(crate) fn ensure_covers(&self, amount: Decimal) -> Result<(), LedgerError> {
        if self.data.balance < amount {
            return Err(LedgerError::InsufficientBalance(self.id.clone()));
        }
        Ok(())
    }

    /// Debits `self` and credits `to` by `amount`.
    ///
    /// Both sides are checked before either balance is written, so an error
    /// leaves both accounts as they were.
    pub(crate) fn transfer_to(
        &mut self,
        to: &mut AccountGuard<'_>,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.ensure_covers(amount)?;
        let credited = to
            .data
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(to.id.clone()))?;

        self.data.balance -= amount;
        to.data.balance = credited;

        self.data.assert_invariants();
        to.data.assert_invariants();
        Ok(())
    }
}

/// Serializable snapshot of an account. Carries no lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub account_id: AccountId,
    pub balance: Decimal,
}
