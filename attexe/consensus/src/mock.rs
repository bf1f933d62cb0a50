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

//! Test environment shared by the driver tests.

use crate::{ProtocolContext, WaitConfig};
use attexe_authority::{Authority, EmulatedAuthority, EmulatedConfig};
use attexe_common::{
    epochs::{EpochClock, EpochConfig},
    ledger::SharedState,
    policy::{PolicyVoter, SigningPolicy},
    time::WallClock,
};
use attexe_observer::{LedgerWatcher, LedgerWatcherConfig};
use attexe_signer::{Participant, Signer};
use std::{sync::Arc, time::Duration};

pub(crate) const PROTOCOL_ID: u8 = 100;
pub(crate) const T0: u64 = 1_700_000_000;

/// 20s voting rounds, 5 per reward epoch (100s epochs).
pub(crate) fn test_epochs() -> EpochClock {
    EpochClock::new(EpochConfig {
        first_round_start: T0,
        round_duration_secs: 20,
        first_reward_epoch_start_round: 0,
        rounds_per_reward_epoch: 5,
    })
    .unwrap()
}

pub(crate) fn genesis_policy(participants: &[Participant]) -> SigningPolicy {
    let voters: Vec<_> = participants
        .iter()
        .map(|participant| PolicyVoter {
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

pub(crate) struct TestEnv {
    pub ctx: ProtocolContext,
    pub authority: Arc<EmulatedAuthority>,
    pub participants: Vec<Participant>,
    pub wall: WallClock,
}

impl TestEnv {
    pub fn new(participants: usize) -> Self {
        Self::with_participants(participants, |all| all.to_vec())
    }

    /// `select` picks (and possibly reorders) the locally-driven subset of
    /// the provisioned participants.
    pub fn with_participants(
        participants: usize,
        select: impl FnOnce(&[Participant]) -> Vec<Participant>,
    ) -> Self {
        Self::with_config(participants, EmulatedConfig::default(), select)
    }

    pub fn with_config(
        participants: usize,
        config: EmulatedConfig,
        select: impl FnOnce(&[Participant]) -> Vec<Participant>,
    ) -> Self {
        let wall = WallClock::start_at(T0);
        let signer = Signer::new();
        let epochs = test_epochs();

        let participants: Vec<_> = (0..participants)
            .map(|_| Participant::generate(&signer))
            .collect();

        let genesis = genesis_policy(&participants);
        let authority = Arc::new(EmulatedAuthority::new(
            epochs,
            wall.clone(),
            genesis.clone(),
            config,
        ));

        let shared = Arc::new(SharedState::new());
        shared.policies.install(genesis);

        let local = select(&participants);

        let ctx = ProtocolContext {
            authority: authority.clone(),
            shared,
            epochs,
            wall: wall.clone(),
            signer,
            participants: Arc::new(local),
            wait: WaitConfig {
                poll_interval: Duration::from_millis(250),
                deadline: Some(Duration::from_secs(300)),
            },
        };

        Self {
            ctx,
            authority,
            participants,
            wall,
        }
    }

    /// Run a ledger watcher in the background so driver waits can observe
    /// authority progress.
    pub fn spawn_watcher(&self) -> tokio::task::JoinHandle<()> {
        let authority: Arc<dyn Authority> = self.authority.clone();
        let watcher = LedgerWatcher::new(
            authority,
            self.ctx.shared.clone(),
            self.ctx.epochs,
            LedgerWatcherConfig::default(),
        );

        tokio::spawn(async move { watcher.run().await })
    }
}
