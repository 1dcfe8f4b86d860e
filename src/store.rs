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

use crate::account::Account;
use crate::{AccountId, LedgerError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Concurrent registry of accounts keyed by id.
///
/// The only way accounts are created, found or enumerated. Registry-level
/// synchronization is DashMap's shard locking; no method here ever waits on
/// a per-account lock.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Registers a new account with `balance` as its opening balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidBalance`] - `balance` is negative.
    /// - [`LedgerError::DuplicateAccountId`] - `id` is already registered.
    ///   The existing account is left as it was.
    pub fn create(&self, id: AccountId, balance: Decimal) -> Result<(), LedgerError> {
        if balance < Decimal::ZERO {
            return Err(LedgerError::InvalidBalance);
        }

        // Entry API makes check-and-insert atomic, so concurrent creates of
        // the same id have exactly one winner.
        match self.accounts.entry(id) {
            Entry::Occupied(entry) => Err(LedgerError::DuplicateAccountId(entry.key().clone())),
            Entry::Vacant(entry) => {
                let account = Account::new(entry.key().clone(), balance);
                entry.insert(Arc::new(account));
                Ok(())
            }
        }
    }

    /// Returns the live handle for `id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AccountNotFound`] if no account has this id.
    pub fn get(&self, id: &str) -> Result<Arc<Account>, LedgerError> {
        match self.accounts.get(id) {
            Some(account) => Ok(Arc::clone(account.value())),
            None => Err(not_found(id)),
        }
    }

    /// Handles of all accounts, sorted by id. Balances are not read here.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut handles: Vec<Arc<Account>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        handles.sort_by(|a, b| a.id().cmp(b.id()));
        handles
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Removes every account. Reset tooling only.
    pub fn clear(&self) {
        self.accounts.clear();
    }
}

fn not_found(id: &str) -> LedgerError {
    match AccountId::new(id) {
        Ok(id) => LedgerError::AccountNotFound(id),
        Err(err) => err,
    }
}
