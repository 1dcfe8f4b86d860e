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

//! Best-effort account notifications.
//!
//! Notices are sent after a transfer commits. Delivery failures are logged
//! and dropped; they never reach the caller of the transfer.

use crate::AccountId;
use crate::error::NotificationError;
use crossbeam::channel::{self, Sender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Delivers a message to the holder of an account.
pub trait Notifier: Send + Sync {
    fn notify(&self, account_id: &AccountId, message: &str) -> Result<(), NotificationError>;
}

/// Writes every notice to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, account_id: &AccountId, message: &str) -> Result<(), NotificationError> {
        info!(account_id = %account_id, message, "sending notification");
        Ok(())
    }
}

struct Notice {
    account_id: AccountId,
    message: String,
}

/// Hands notices to a background worker so callers never wait on delivery.
///
/// The queue is bounded. When it is full a new notice is dropped with a
/// warning rather than blocking the transfer that produced it.
///
/// Dropping the queue closes the channel; the worker drains what is already
/// queued and exits.
pub struct QueuedNotifier {
    sender: Option<Sender<Notice>>,
    worker: Option<JoinHandle<()>>,
}

impl QueuedNotifier {
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Spawns a worker thread delivering through `inner`, holding at most
    /// [`Self::DEFAULT_CAPACITY`] pending notices.
    pub fn spawn(inner: Arc<dyn Notifier>) -> std::io::Result<Self> {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    /// Like [`spawn`](Self::spawn) with at most `capacity` pending notices.
    pub fn with_capacity(inner: Arc<dyn Notifier>, capacity: usize) -> std::io::Result<Self> {
        let (sender, receiver) = channel::bounded::<Notice>(capacity.max(1));
        let worker = thread::Builder::new()
            .name("notifier".to_string())
            .spawn(move || {
                for notice in receiver {
                    if let Err(e) = inner.notify(&notice.account_id, &notice.message) {
                        warn!(account_id = %notice.account_id, error = %e, "notification dropped");
                    }
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, account_id: &AccountId, message: &str) -> Result<(), NotificationError> {
        let sender = self.sender.as_ref().ok_or(NotificationError::Closed)?;
        let notice = Notice {
            account_id: account_id.clone(),
            message: message.to_string(),
        };
        match sender.try_send(notice) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(notice)) => {
                warn!(
                    account_id = %notice.account_id,
                    message = %notice.message,
                    "notice queue full, dropping notification"
                );
                Err(NotificationError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(NotificationError::Closed),
        }
    }
}

impl Drop for QueuedNotifier {
    fn drop(&mut self) {
        // Disconnect first so the worker's receive loop ends.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("notifier worker panicked");
            }
        }
    }
}
