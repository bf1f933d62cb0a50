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

//! Top-level attexe service.
//!
//! Wires the shared state, the ledger watcher and the three self-rearming
//! protocol tasks (signing-policy driver, voting-round driver, reward
//! offering) behind one [`Service::run`] future.


use anyhow::Result;
use attexe_authority::Authority;
use attexe_common::{
    epochs::{EpochClock, EpochConfig},
    ledger::SharedState,
    policy::SigningPolicy,
    time::WallClock,
};
use attexe_consensus::{
    PolicyDriverConfig, ProtocolContext, RewardOfferingConfig, RewardOfferingScheduler,
    RoundDriverConfig, Scheduler, SigningPolicyDriver, VotingRoundDriver, WaitConfig,
};
use attexe_observer::{LedgerWatcher, LedgerWatcherConfig};
use attexe_signer::{Participant, Signer};
use std::sync::Arc;

/// Unit-weight epoch-0 signing policy over the provisioned participants,
/// with a simple-majority threshold.
pub fn genesis_policy(participants: &[Participant]) -> SigningPolicy {
    let voters: Vec<_> = participants
        .iter()
        .map(|participant| attexe_common::policy::PolicyVoter {
            address: participant.keys().policy_signer.address(),
            weight: 1,
        })
        .collect();
    let threshold = voters.len() as u32 / 2 + 1;

    SigningPolicy {
        reward_epoch_id: 0,
        start_voting_round_id: 0,
        threshold,
        seed: [0; 32].into(),
        voters,
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Epoch timing parameters, as reported by the authority at genesis.
    pub epoch: EpochConfig,
    /// The epoch-0 signing policy produced by the out-of-scope deployment.
    pub genesis_policy: SigningPolicy,
    pub watcher: LedgerWatcherConfig,
    pub wait: WaitConfig,
    pub policy: PolicyDriverConfig,
    pub round: RoundDriverConfig,
    pub rewards: RewardOfferingConfig,
}

pub struct Service {
    watcher: LedgerWatcher,
    scheduler: Scheduler,
    shared: Arc<SharedState>,
}

impl Service {
    pub fn new(
        config: ServiceConfig,
        authority: Arc<dyn Authority>,
        signer: Signer,
        participants: Vec<Participant>,
        wall: WallClock,
    ) -> Result<Self> {
        let epochs = EpochClock::new(config.epoch)?;

        let shared = Arc::new(SharedState::new());
        shared.policies.install(config.genesis_policy);

        let watcher = LedgerWatcher::new(
            authority.clone(),
            shared.clone(),
            epochs,
            config.watcher,
        );

        let ctx = ProtocolContext {
            authority,
            shared: shared.clone(),
            epochs,
            wall: wall.clone(),
            signer,
            participants: Arc::new(participants),
            wait: config.wait,
        };

        let now = wall.now();
        let mut scheduler = Scheduler::new(wall);

        scheduler.schedule(
            now,
            Box::new(SigningPolicyDriver::new(ctx.clone(), config.policy)),
        );
        scheduler.schedule(
            now,
            Box::new(VotingRoundDriver::new(ctx.clone(), config.round)),
        );

        let current_epoch_offers =
            epochs.reward_epoch_start(epochs.reward_epoch_at(now)) + config.rewards.offer_delay.as_secs();
        scheduler.schedule(
            current_epoch_offers.max(now),
            Box::new(RewardOfferingScheduler::new(ctx, config.rewards)),
        );

        Ok(Self {
            watcher,
            scheduler,
            shared,
        })
    }

    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Run the watcher loop and the scheduler until the scheduler runs out
    /// of armed tasks (all drivers halted).
    pub async fn run(self) -> Result<()> {
        let Self {
            watcher, scheduler, ..
        } = self;

        tracing::info!("🚀 attexe service started");

        tokio::select! {
            _ = watcher.run() => unreachable!("watcher loop never returns"),
            res = scheduler.run() => res,
        }
    }
}
