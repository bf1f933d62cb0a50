// This file is part of Gear.
//
// Copyright (C) 2025 Gear Technologies Inc.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Wall-clock time as seen by the protocol services.
//!
//! [`WallClock`] maps the tokio monotonic clock onto unix timestamps, so that
//! paused-time tests (`tokio::time::pause`) get a deterministic virtual clock
//! through the exact code paths production uses.

use crate::Timestamp;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

#[derive(Clone, Debug)]
pub struct WallClock {
    base_instant: Instant,
    base_unix: Timestamp,
}

impl WallClock {
    /// A clock that reads `base_unix` at the moment of construction.
    pub fn start_at(base_unix: Timestamp) -> Self {
        Self {
            base_instant: Instant::now(),
            base_unix,
        }
    }

    /// A clock anchored to the current system time.
    pub fn system() -> Self {
        let base_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self::start_at(base_unix)
    }

    pub fn now(&self) -> Timestamp {
        self.base_unix + self.base_instant.elapsed().as_secs()
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Sleeps until the given unix timestamp; returns immediately if it has
    /// already passed.
    pub async fn sleep_until(&self, timestamp: Timestamp) {
        let target =
            self.base_instant + Duration::from_secs(timestamp.saturating_sub(self.base_unix));
        tokio::time::sleep_until(target).await;
    }
}
