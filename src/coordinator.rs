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

//! Locked, balance-checked transfers between two accounts.
//!
//! A transfer goes through these stages:
//!
//! ```text
//! Resolving ──► Locking ──► Validating ──► Mutating ──► Notifying ──► Done
//!     │            │             │
//!     ▼            ▼             ▼
//! AccountNotFound LockTimeout  InsufficientBalance
//! ```
//!
//! Both account locks are taken in ascending id order whatever the transfer
//! direction, so two transfers over the same pair can never wait on each
//! other in a cycle. Every error exit leaves both balances unchanged and
//! releases whatever lock was already taken.

use crate::account::Account;
use crate::notifier::Notifier;
use crate::{AccountStore, LedgerConfig, LedgerError};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct TransferCoordinator {
    store: Arc<AccountStore>,
    notifier: Arc<dyn Notifier>,
    lock_timeout: Duration,
}

impl TransferCoordinator {
    pub fn new(store: Arc<AccountStore>, notifier: Arc<dyn Notifier>, config: LedgerConfig) -> Self {
        Self {
            store,
            notifier,
            lock_timeout: config.lock_timeout,
        }
    }

    /// Moves `amount` from `from_id` to `to_id`.
    ///
    /// A transfer from an account to itself changes nothing but still
    /// requires the balance to cover `amount`; no notices are sent for it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::AccountNotFound`] - either id is unknown (`from_id` is checked first).
    /// - [`LedgerError::LockTimeout`] - an account lock was not acquired within the timeout.
    /// - [`LedgerError::InsufficientBalance`] - `amount` exceeds the source balance.
    /// - [`LedgerError::BalanceOverflow`] - the credit exceeds the decimal range.
    pub fn transfer(&self, from_id: &str, to_id: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let from = self.store.get(from_id)?;
        if from_id == to_id {
            return self.check_self_transfer(&from, amount);
        }
        let to = self.store.get(to_id)?;

        self.move_funds(&from, &to, amount).inspect_err(|e| match e {
            LedgerError::LockTimeout(id) => {
                warn!(from = %from.id(), to = %to.id(), locked_out = %id, "transfer lock timeout")
            }
            _ => debug!(from = %from.id(), to = %to.id(), %amount, error = %e, "transfer rejected"),
        })?;
        debug!(from = %from.id(), to = %to.id(), %amount, "transfer committed");

        self.notify_legs(&from, &to, amount);
        Ok(())
    }

    fn move_funds(&self, from: &Account, to: &Account, amount: Decimal) -> Result<(), LedgerError> {
        let from_first = from.id() < to.id();
        let (first, second) = if from_first { (from, to) } else { (to, from) };

        // If the second lock times out, `first_guard` drops on return and
        // releases the first lock.
        let mut first_guard = first.lock_for(self.lock_timeout)?;
        let mut second_guard = second.lock_for(self.lock_timeout)?;

        let (from_guard, to_guard) = if from_first {
            (&mut first_guard, &mut second_guard)
        } else {
            (&mut second_guard, &mut first_guard)
        };
        from_guard.transfer_to(to_guard, amount)
    }

    fn check_self_transfer(&self, account: &Account, amount: Decimal) -> Result<(), LedgerError> {
        let guard = account.lock_for(self.lock_timeout)?;
        guard.ensure_covers(amount)?;
        debug!(account = %account.id(), %amount, "self-transfer accepted as no-op");
        Ok(())
    }

    /// Runs after both locks are released.
    fn notify_legs(&self, from: &Account, to: &Account, amount: Decimal) {
        let debit = format!("Amount debited: {amount}. Transferred to account {}", to.id());
        let credit = format!("Amount credited: {amount}. Received from account {}", from.id());

        for (account, message) in [(from, debit), (to, credit)] {
            if let Err(e) = self.notifier.notify(account.id(), &message) {
                warn!(account_id = %account.id(), error = %e, "notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountId;
    use crate::error::NotificationError;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::thread;

    #[derive(Default)]
    struct Recorder {
        notices: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, account_id: &AccountId, message: &str) -> Result<(), NotificationError> {
            self.notices
                .lock()
                .push((account_id.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn notify(&self, _: &AccountId, _: &str) -> Result<(), NotificationError> {
            Err(NotificationError::Rejected("smtp down".to_string()))
        }
    }

    fn setup(notifier: Arc<dyn Notifier>, timeout_ms: u64) -> (Arc<AccountStore>, TransferCoordinator) {
        let store = Arc::new(AccountStore::new());
        let coordinator = TransferCoordinator::new(
            Arc::clone(&store),
            notifier,
            LedgerConfig::with_lock_timeout_ms(timeout_ms),
        );
        (store, coordinator)
    }

    fn create(store: &AccountStore, id: &str, balance: Decimal) {
        store.create(AccountId::new(id).unwrap(), balance).unwrap();
    }

    fn balance(store: &AccountStore, id: &str) -> Decimal {
        store.get(id).unwrap().snapshot(Duration::from_millis(50)).unwrap().balance
    }

    #[test]
    fn transfer_sends_debit_and_credit_notices() {
        let recorder = Arc::new(Recorder::default());
        let (store, coordinator) = setup(recorder.clone(), 100);
        create(&store, "from", dec!(1050));
        create(&store, "to", dec!(950));

        coordinator.transfer("from", "to", dec!(50)).unwrap();

        let notices = recorder.notices.lock();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].0, "from");
        assert_eq!(notices[0].1, "Amount debited: 50. Transferred to account to");
        assert_eq!(notices[1].0, "to");
        assert_eq!(notices[1].1, "Amount credited: 50. Received from account from");
    }

    #[test]
    fn failed_transfer_sends_no_notices() {
        let recorder = Arc::new(Recorder::default());
        let (store, coordinator) = setup(recorder.clone(), 100);
        create(&store, "from", dec!(1));
        create(&store, "to", dec!(1));

        let result = coordinator.transfer("from", "to", dec!(2));
        assert!(result.is_err());
        assert!(recorder.notices.lock().is_empty());
    }

    #[test]
    fn notifier_failure_does_not_fail_transfer() {
        let (store, coordinator) = setup(Arc::new(Failing), 100);
        create(&store, "from", dec!(100));
        create(&store, "to", dec!(0));

        coordinator.transfer("from", "to", dec!(40)).unwrap();

        assert_eq!(balance(&store, "from"), dec!(60));
        assert_eq!(balance(&store, "to"), dec!(40));
    }

    #[test]
    fn non_positive_amount_rejected_before_lookup() {
        let (_store, coordinator) = setup(Arc::new(Recorder::default()), 100);

        assert_eq!(
            coordinator.transfer("ghost", "alsoGhost", Decimal::ZERO),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            coordinator.transfer("ghost", "alsoGhost", dec!(-1)),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn missing_destination_reported_after_source() {
        let (store, coordinator) = setup(Arc::new(Recorder::default()), 100);
        create(&store, "from", dec!(10));

        assert_eq!(
            coordinator.transfer("from", "ghost", dec!(1)),
            Err(LedgerError::AccountNotFound(AccountId::new("ghost").unwrap()))
        );
        assert_eq!(balance(&store, "from"), dec!(10));
    }

    #[test]
    fn self_transfer_is_validated_no_op() {
        let recorder = Arc::new(Recorder::default());
        let (store, coordinator) = setup(recorder.clone(), 100);
        create(&store, "A", dec!(100));

        coordinator.transfer("A", "A", dec!(100)).unwrap();
        assert_eq!(balance(&store, "A"), dec!(100));
        assert!(recorder.notices.lock().is_empty());

        assert_eq!(
            coordinator.transfer("A", "A", dec!(101)),
            Err(LedgerError::InsufficientBalance(AccountId::new("A").unwrap()))
        );
        assert_eq!(balance(&store, "A"), dec!(100));
    }

    #[test]
    fn lock_timeout_on_second_lock_releases_first() {
        let (store, coordinator) = setup(Arc::new(Recorder::default()), 20);
        create(&store, "a", dec!(100));
        create(&store, "b", dec!(100));

        // "a" sorts first; hold "b" so the second acquisition times out.
        let b = store.get("b").unwrap();
        let held = b.lock_for(Duration::from_millis(20)).unwrap();

        let result = coordinator.transfer("a", "b", dec!(10));
        assert_eq!(result, Err(LedgerError::LockTimeout(AccountId::new("b").unwrap())));
        drop(held);

        // "a" must be free again: a fresh lock succeeds immediately.
        let a = store.get("a").unwrap();
        assert!(a.lock_for(Duration::from_millis(1)).is_ok());
        assert_eq!(balance(&store, "a"), dec!(100));
        assert_eq!(balance(&store, "b"), dec!(100));
    }

    #[test]
    fn lock_timeout_reported_from_another_thread() {
        let (store, coordinator) = setup(Arc::new(Recorder::default()), 20);
        create(&store, "x", dec!(5));
        create(&store, "y", dec!(5));
        let coordinator = Arc::new(coordinator);

        let x = store.get("x").unwrap();
        let held = x.lock_for(Duration::from_millis(20)).unwrap();

        let worker = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.transfer("y", "x", dec!(1)))
        };
        let result = worker.join().unwrap();
        drop(held);

        assert_eq!(result, Err(LedgerError::LockTimeout(AccountId::new("x").unwrap())));
        assert_eq!(balance(&store, "x"), dec!(5));
        assert_eq!(balance(&store, "y"), dec!(5));
    }
}
