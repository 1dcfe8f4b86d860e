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

//! # Ledger Transfer
//!
//! This library keeps a set of monetary accounts in memory and moves funds
//! between any two of them atomically under concurrent access.
//!
//! ## Core Components
//!
//! - [`AccountStore`]: Concurrent registry of accounts with create-once semantics
//! - [`TransferCoordinator`]: Locked, balance-checked, deadlock-free transfers
//! - [`Ledger`]: Facade wiring a store and a coordinator for the transport layer
//! - [`Notifier`]: Best-effort notices sent after a transfer commits
//! - [`LedgerError`]: Error types for account and transfer failures
//!
//! ## Example
//!
//! ```
//! use ledger_transfer_rs::Ledger;
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::default();
//! ledger.create_account("from", dec!(1050)).unwrap();
//! ledger.create_account("to", dec!(950)).unwrap();
//!
//! ledger.transfer("from", "to", dec!(50)).unwrap();
//!
//! assert_eq!(ledger.get_account("from").unwrap().balance, dec!(1000));
//! assert_eq!(ledger.get_account("to").unwrap().balance, dec!(1000));
//! ```
//!
//! ## Thread Safety
//!
//! Each account carries its own lock. A transfer takes the two locks in
//! ascending account id order, each with a bounded wait, so transfers over
//! disjoint accounts run in parallel and transfers over shared accounts
//! cannot deadlock.

pub mod account;
pub mod api;
mod base;
mod config;
mod coordinator;
pub mod error;
mod ledger;
pub mod notifier;
mod store;

pub use account::{Account, AccountView};
pub use base::AccountId;
pub use config::LedgerConfig;
pub use coordinator::TransferCoordinator;
pub use error::{LedgerError, NotificationError};
pub use ledger::Ledger;
pub use notifier::{LogNotifier, Notifier, QueuedNotifier};
pub use store::AccountStore;
