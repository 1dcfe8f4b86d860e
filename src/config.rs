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

use std::time::Duration;

/// Runtime settings for the transfer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on each per-account lock acquisition.
    pub lock_timeout: Duration,
}

impl LedgerConfig {
    pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1000;

    pub fn with_lock_timeout_ms(millis: u64) -> Self {
        Self {
            lock_timeout: Duration::from_millis(millis),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::with_lock_timeout_ms(Self::DEFAULT_LOCK_TIMEOUT_MS)
    }
}
