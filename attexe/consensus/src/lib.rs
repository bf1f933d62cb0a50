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

//! # Protocol Drivers
//!
//! The round scheduler and multi-phase protocol state machines of attexe:
//!
//! * [`SigningPolicyDriver`] — drives one reward epoch's signing-policy
//!   handoff (random seed acquisition, vote-power snapshot, voter
//!   re-registration, policy publication, threshold ratification).
//! * [`VotingRoundDriver`] — drives one voting round through
//!   commit → reveal → signature submission → finalization.
//! * [`FinalizationEngine`] — assembles policy-ordered threshold signatures
//!   into a finalization payload and submits it to the relay.
//! * [`RewardOfferingScheduler`] — posts reward offers once per reward epoch.
//!
//! All drivers are [`EpochTask`]s fired by one [`Scheduler`] controller loop
//! and re-arm themselves against epoch/round boundaries, so completion-time
//! drift does not accumulate. Ledger waits are bounded polling via
//! [`wait_until`].

mod finalize;
mod policy_driver;
mod rewards;
mod round_driver;
mod scheduler;
mod wait;

#[cfg(test)]
mod mock;

pub use finalize::FinalizationEngine;
pub use policy_driver::{PolicyDriverConfig, SigningPolicyDriver};
pub use rewards::{RewardOfferingConfig, RewardOfferingScheduler};
pub use round_driver::{RoundDriverConfig, VotingRoundDriver};
pub use scheduler::{EpochTask, Scheduler};
pub use wait::{WaitConfig, WaitTimeout, wait_until};

use attexe_authority::Authority;
use attexe_common::{epochs::EpochClock, ledger::SharedState, time::WallClock};
use attexe_signer::{Participant, Signer};
use std::sync::Arc;

/// The context shared by all protocol drivers.
///
/// Shared mutable state ([`SharedState`]) is written only by the ledger
/// watcher; drivers read it as polling snapshots.
#[derive(Clone)]
pub struct ProtocolContext {
    pub authority: Arc<dyn Authority>,
    pub shared: Arc<SharedState>,
    pub epochs: EpochClock,
    pub wall: WallClock,
    pub signer: Signer,
    pub participants: Arc<Vec<Participant>>,
    pub wait: WaitConfig,
}
