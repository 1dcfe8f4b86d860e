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

use crate::account::AccountView;
use crate::coordinator::TransferCoordinator;
use crate::notifier::{LogNotifier, Notifier};
use crate::{AccountId, AccountStore, LedgerConfig, LedgerError};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for the transport layer.
///
/// Wires one [`AccountStore`] into a [`TransferCoordinator`]. The store is
/// passed in rather than created here so callers and tests can share it.
/// Balance reads wait on account locks no longer than transfers do.
pub struct Ledger {
    store: Arc<AccountStore>,
    coordinator: TransferCoordinator,
    lock_timeout: Duration,
}

impl Ledger {
    pub fn new(store: Arc<AccountStore>, notifier: Arc<dyn Notifier>, config: LedgerConfig) -> Self {
        let coordinator = TransferCoordinator::new(Arc::clone(&store), notifier, config);
        Self {
            store,
            coordinator,
            lock_timeout: config.lock_timeout,
        }
    }

    /// Opens an account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAccountId`] - `id` is empty.
    /// - [`LedgerError::InvalidBalance`] - `balance` is negative.
    /// - [`LedgerError::DuplicateAccountId`] - `id` is taken.
    pub fn create_account(&self, id: &str, balance: Decimal) -> Result<(), LedgerError> {
        self.store.create(AccountId::new(id)?, balance)
    }

    /// Returns a snapshot of the account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AccountNotFound`] - no account has this id.
    /// - [`LedgerError::LockTimeout`] - the account stayed locked for the whole timeout.
    pub fn get_account(&self, id: &str) -> Result<AccountView, LedgerError> {
        self.store.get(id)?.snapshot(self.lock_timeout)
    }

    /// Snapshots of every account, sorted by id.
    ///
    /// Each account is read under its own lock, one at a time. Fails with
    /// [`LedgerError::LockTimeout`] if any of them stays locked for the
    /// whole timeout.
    pub fn accounts(&self) -> Result<Vec<AccountView>, LedgerError> {
        self.store
            .accounts()
            .iter()
            .map(|account| account.snapshot(self.lock_timeout))
            .collect()
    }

    /// See [`TransferCoordinator::transfer`].
    pub fn transfer(&self, from_id: &str, to_id: &str, amount: Decimal) -> Result<(), LedgerError> {
        self.coordinator.transfer(from_id, to_id, amount)
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(
            Arc::new(AccountStore::new()),
            Arc::new(LogNotifier),
            LedgerConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_and_read_back() {
        let ledger = Ledger::default();
        ledger.create_account("Id-123", dec!(1000)).unwrap();

        let view = ledger.get_account("Id-123").unwrap();
        assert_eq!(view.account_id.as_str(), "Id-123");
        assert_eq!(view.balance, dec!(1000));
    }

    #[test]
    fn empty_id_rejected() {
        let ledger = Ledger::default();
        assert_eq!(
            ledger.create_account("", dec!(1)),
            Err(LedgerError::InvalidAccountId)
        );
    }

    #[test]
    fn shares_injected_store() {
        let store = Arc::new(AccountStore::new());
        let ledger = Ledger::new(Arc::clone(&store), Arc::new(LogNotifier), LedgerConfig::default());

        ledger.create_account("A", dec!(1)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(Arc::ptr_eq(ledger.store(), &store));
    }

    #[test]
    fn transfer_updates_views() {
        let ledger = Ledger::default();
        ledger.create_account("from", dec!(1050)).unwrap();
        ledger.create_account("to", dec!(950)).unwrap();

        ledger.transfer("from", "to", dec!(50)).unwrap();

        let views = ledger.accounts().unwrap();
        assert_eq!(views[0].balance, dec!(1000));
        assert_eq!(views[1].balance, dec!(1000));
    }

    #[test]
    fn reads_of_a_locked_account_time_out() {
        let ledger = Ledger::new(
            Arc::new(AccountStore::new()),
            Arc::new(LogNotifier),
            LedgerConfig::with_lock_timeout_ms(30),
        );
        ledger.create_account("a", dec!(1)).unwrap();
        ledger.create_account("b", dec!(2)).unwrap();

        let b = ledger.store().get("b").unwrap();
        let held = b.lock_for(Duration::from_millis(30)).unwrap();

        let locked_out = LedgerError::LockTimeout(AccountId::new("b").unwrap());
        assert_eq!(ledger.get_account("b").unwrap_err(), locked_out);
        assert_eq!(ledger.accounts().unwrap_err(), locked_out);
        assert_eq!(ledger.get_account("a").unwrap().balance, dec!(1));

        drop(held);
        assert_eq!(ledger.accounts().unwrap().len(), 2);
    }

    #[test]
    fn read_waits_at_most_the_timeout_behind_a_stalled_transfer() {
        let ledger = Arc::new(Ledger::new(
            Arc::new(AccountStore::new()),
            Arc::new(LogNotifier),
            LedgerConfig::with_lock_timeout_ms(300),
        ));
        ledger.create_account("a", dec!(10)).unwrap();
        ledger.create_account("b", dec!(10)).unwrap();

        // Holding "b" makes a transfer a -> b sit on "a" while it waits.
        let b = ledger.store().get("b").unwrap();
        let held = b.lock_for(Duration::from_millis(300)).unwrap();
        let transfer = {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || ledger.transfer("a", "b", dec!(1)))
        };
        std::thread::sleep(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let read = ledger.get_account("a");
        assert!(started.elapsed() < Duration::from_secs(2));

        let result = transfer.join().unwrap();
        drop(held);
        assert_eq!(result, Err(LedgerError::LockTimeout(AccountId::new("b").unwrap())));
        // The read either got "a" once the transfer gave up, or timed out.
        if let Ok(view) = read {
            assert_eq!(view.balance, dec!(10));
        }
        assert_eq!(ledger.get_account("a").unwrap().balance, dec!(10));
    }
}
