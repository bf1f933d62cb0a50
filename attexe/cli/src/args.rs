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

use clap::Parser;
use serde::Deserialize;

/// attexe: epoch/round attestation protocol simulator.
#[derive(Clone, Debug, Parser, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Args {
    /// Number of simulated voters.
    #[arg(long, default_value = "4")]
    #[serde(default = "defaults::participants")]
    pub participants: usize,

    /// Voting round duration, seconds.
    #[arg(long, default_value = "20")]
    #[serde(default = "defaults::round_secs")]
    pub round_secs: u64,

    /// Voting rounds per reward epoch.
    #[arg(long, default_value = "5")]
    #[serde(default = "defaults::rounds_per_epoch")]
    pub rounds_per_epoch: u64,

    /// Skip commit/reveal/signature submissions.
    #[arg(long)]
    #[serde(default)]
    pub skip_submit: bool,

    /// Skip round finalization.
    #[arg(long)]
    #[serde(default)]
    pub skip_finalize: bool,

    /// Post reward offers without waiting for the epoch-started event.
    #[arg(long)]
    #[serde(default)]
    pub force_offers: bool,

    /// Amount of each per-epoch reward offer; 0 disables offering.
    #[arg(long, default_value = "1000000")]
    #[serde(default = "defaults::offer_amount")]
    pub offer_amount: u128,

    /// Authority poll interval, milliseconds.
    #[arg(long, default_value = "500")]
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Deadline for ledger waits, seconds; 0 waits indefinitely.
    #[arg(long, default_value = "3600")]
    #[serde(default = "defaults::wait_deadline_secs")]
    pub wait_deadline_secs: u64,
}

mod defaults {
    pub fn participants() -> usize {
        4
    }

    pub fn round_secs() -> u64 {
        20
    }

    pub fn rounds_per_epoch() -> u64 {
        5
    }

    pub fn offer_amount() -> u128 {
        1_000_000
    }

    pub fn poll_interval_ms() -> u64 {
        500
    }

    pub fn wait_deadline_secs() -> u64 {
        3600
    }
}
