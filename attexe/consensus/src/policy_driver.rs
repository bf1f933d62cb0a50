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

//! Per-reward-epoch signing-policy handoff state machine.
//!
//! Phase transitions, in strict order:
//! ```text
//! AwaitRandomAcquisition
//!        └───> AwaitVotePowerSnapshot
//!                    └───> VoterRegistration
//!                               └───> AwaitPolicyPublication
//!                                          └───> ThresholdRatification
//! ```
//! Every `Await*` phase blocks on an event-ledger predicate; the two action
//! phases submit participant signatures. Ratification terminates as soon as
//! the authority reports the weighted threshold reached — later participants
//! are not required to act.

use crate::{EpochTask, ProtocolContext, wait_until};
use anyhow::{Result, ensure};
use async_trait::async_trait;
use attexe_common::{
    Address, RewardEpochId, Timestamp, events::EventKind, policy::PolicyRatification,
};
use std::collections::BTreeSet;

/// Participants excluded from the action phases, by identity address.
#[derive(Clone, Debug, Default)]
pub struct PolicyDriverConfig {
    pub registration_skip: BTreeSet<Address>,
    pub ratification_skip: BTreeSet<Address>,
}

pub struct SigningPolicyDriver {
    ctx: ProtocolContext,
    config: PolicyDriverConfig,
}

impl SigningPolicyDriver {
    pub fn new(ctx: ProtocolContext, config: PolicyDriverConfig) -> Self {
        Self { ctx, config }
    }

    /// Drive the handoff for the signing policy of `epoch + 1`, observed and
    /// acted on during `epoch`.
    pub async fn run_epoch(&self, epoch: RewardEpochId) -> Result<()> {
        let ctx = &self.ctx;
        let next_epoch = epoch + 1;

        tracing::info!(epoch, "🗳 starting signing policy handoff");

        wait_until(&ctx.wall, &ctx.wait, "random acquisition start", || {
            ctx.shared
                .ledger
                .has_event(epoch, EventKind::RandomAcquisitionStarted)
        })
        .await?;

        ensure!(
            ctx.authority.randomness_quality().await?,
            "authority reports unacceptable randomness quality in epoch {epoch}",
        );

        wait_until(&ctx.wall, &ctx.wait, "vote power snapshot", || {
            ctx.shared
                .ledger
                .has_event(epoch, EventKind::VotePowerBlockSelected)
        })
        .await?;

        self.register_voters(next_epoch).await;

        wait_until(&ctx.wall, &ctx.wait, "signing policy publication", || {
            ctx.shared
                .ledger
                .has_event(epoch, EventKind::SigningPolicyInitialized)
        })
        .await?;

        self.ratify_policy(next_epoch).await
    }

    async fn register_voters(&self, next_epoch: RewardEpochId) {
        let ctx = &self.ctx;

        for participant in ctx.participants.iter() {
            let identity = participant.identity_address();
            if self.config.registration_skip.contains(&identity) {
                tracing::debug!(%identity, "skipping voter registration");
                continue;
            }

            let registration = participant.registration(next_epoch);
            let signed = match participant.keys().policy_signer.sign(&ctx.signer, registration) {
                Ok(signed) => signed,
                Err(err) => {
                    tracing::warn!(%identity, "failed to sign registration: {err:#}");
                    continue;
                }
            };

            match ctx.authority.register_voter(signed).await {
                Ok(()) => tracing::debug!(%identity, next_epoch, "voter registered"),
                Err(err) => tracing::warn!(%identity, "voter registration failed: {err:#}"),
            }
        }
    }

    /// Submit ratification signatures in the provided participant order until
    /// the authority reports the threshold reached.
    async fn ratify_policy(&self, next_epoch: RewardEpochId) -> Result<()> {
        let ctx = &self.ctx;

        let policy_hash = ctx.authority.policy_hash(next_epoch).await?;

        for participant in ctx.participants.iter() {
            let identity = participant.identity_address();
            if self.config.ratification_skip.contains(&identity) {
                tracing::debug!(%identity, "skipping policy ratification");
                continue;
            }

            let ratification = PolicyRatification {
                reward_epoch_id: next_epoch,
                policy_hash,
            };

            let signed = match participant.keys().policy_signer.sign(&ctx.signer, ratification) {
                Ok(signed) => signed,
                Err(err) => {
                    tracing::warn!(%identity, "failed to sign policy hash: {err:#}");
                    continue;
                }
            };

            let ack = match ctx.authority.sign_policy(signed).await {
                Ok(ack) => ack,
                Err(err) => {
                    tracing::warn!(%identity, "policy signature submission failed: {err:#}");
                    continue;
                }
            };

            ensure!(
                ack.acknowledged,
                "policy signature for epoch {next_epoch} was not acknowledged",
            );

            if ack.threshold_reached {
                tracing::info!(next_epoch, "✅ signing policy ratified");
                return Ok(());
            }
        }

        tracing::warn!(
            next_epoch,
            "local participants did not reach the ratification threshold",
        );

        Ok(())
    }
}

#[async_trait]
impl EpochTask for SigningPolicyDriver {
    fn name(&self) -> &'static str {
        "signing-policy-driver"
    }

    async fn run(&mut self, now: Timestamp) -> Result<Option<Timestamp>> {
        let epoch = self.ctx.epochs.reward_epoch_at(now);

        match self.ctx.authority.current_reward_epoch().await {
            Ok(reported) if reported != epoch => {
                tracing::warn!(
                    derived = epoch,
                    reported,
                    "epoch clock disagrees with the authority",
                );
            }
            Err(err) => tracing::warn!("cannot query current reward epoch: {err:#}"),
            Ok(_) => {}
        }

        self.run_epoch(epoch).await?;

        Ok(Some(self.ctx.epochs.next_reward_epoch_start(now)))
    }
}
