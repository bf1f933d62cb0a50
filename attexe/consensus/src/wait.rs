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

//! Bounded polling waits on the shared ledger state.

use attexe_common::time::WallClock;
use std::time::Duration;

/// Polling cadence and deadline for every "await ledger event" step.
#[derive(Clone, Debug)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    /// `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            deadline: Some(Duration::from_secs(3600)),
        }
    }
}

/// A wait deadline expired before the condition became observable.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("wait for {condition} timed out after {elapsed_secs}s")]
pub struct WaitTimeout {
    pub condition: &'static str,
    pub elapsed_secs: u64,
}

/// Poll `predicate` at the configured interval until it holds, or until the
/// configured deadline expires. Suspends only the calling state machine.
pub async fn wait_until(
    wall: &WallClock,
    config: &WaitConfig,
    condition: &'static str,
    mut predicate: impl FnMut() -> bool,
) -> Result<(), WaitTimeout> {
    let started = wall.now();

    loop {
        if predicate() {
            return Ok(());
        }

        let elapsed_secs = wall.now().saturating_sub(started);
        if let Some(deadline) = config.deadline
            && elapsed_secs >= deadline.as_secs()
        {
            return Err(WaitTimeout {
                condition,
                elapsed_secs,
            });
        }

        wall.sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    #[tokio::test(start_paused = true)]
    async fn resolves_once_condition_holds() {
        let wall = WallClock::start_at(1_000);
        let flag = Arc::new(AtomicBool::new(false));

        let setter = {
            let wall = wall.clone();
            let flag = flag.clone();
            async move {
                wall.sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::Relaxed);
            }
        };

        let config = WaitConfig::default();
        let waiter = wait_until(&wall, &config, "flag", || {
            flag.load(Ordering::Relaxed)
        });

        let (result, ()) = tokio::join!(waiter, setter);
        result.unwrap();
        assert!(wall.now() >= 1_005);
    }

    #[tokio::test(start_paused = true)]
    async fn expires_with_typed_error() {
        let wall = WallClock::start_at(1_000);
        let config = WaitConfig {
            poll_interval: Duration::from_millis(250),
            deadline: Some(Duration::from_secs(10)),
        };

        let err = wait_until(&wall, &config, "never", || false)
            .await
            .unwrap_err();

        assert_eq!(err.condition, "never");
        assert!(err.elapsed_secs >= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_condition_does_not_sleep() {
        let wall = WallClock::start_at(1_000);

        wait_until(&wall, &WaitConfig::default(), "now", || true)
            .await
            .unwrap();

        assert_eq!(wall.now(), 1_000);
    }
}
