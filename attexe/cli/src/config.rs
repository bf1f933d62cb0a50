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

//! Application config in one place.

use crate::args::Args;
use anyhow::{Result, ensure};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of simulated voters.
    pub participants: usize,

    /// Voting round duration.
    pub round_duration: Duration,

    /// Voting rounds per reward epoch.
    pub rounds_per_epoch: u64,

    /// Skip commit/reveal/signature submissions.
    pub skip_submit: bool,

    /// Skip round finalization.
    pub skip_finalize: bool,

    /// Post reward offers without waiting for the epoch-started event.
    pub force_offers: bool,

    /// Amount of each per-epoch reward offer; zero disables offering.
    pub offer_amount: u128,

    /// Authority poll interval.
    pub poll_interval: Duration,

    /// Deadline for ledger waits; `None` waits indefinitely.
    pub wait_deadline: Option<Duration>,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        ensure!(args.participants > 0, "at least one participant required");
        ensure!(args.round_secs > 0, "round duration must be positive");
        ensure!(
            args.rounds_per_epoch > 0,
            "rounds per epoch must be positive"
        );

        Ok(Config {
            participants: args.participants,
            round_duration: Duration::from_secs(args.round_secs),
            rounds_per_epoch: args.rounds_per_epoch,
            skip_submit: args.skip_submit,
            skip_finalize: args.skip_finalize,
            force_offers: args.force_offers,
            offer_amount: args.offer_amount,
            poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
            wait_deadline: (args.wait_deadline_secs > 0)
                .then(|| Duration::from_secs(args.wait_deadline_secs)),
        })
    }
}
