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

//! Per-voting-round commit/reveal/sign/finalize state machine.
//!
//! Waits for the authority to initialize the round, then walks every local
//! participant through the submission phases at their deadlines and hands the
//! round to the [`FinalizationEngine`]. Per-participant failures are logged
//! and skipped; a failed finalization still finishes the round.

use crate::{EpochTask, FinalizationEngine, ProtocolContext, wait_until};
use anyhow::Result;
use async_trait::async_trait;
use attexe_common::{
    Timestamp, ToDigest, VotingRoundId, keccak256,
    policy::{RoundSubmission, SignatureSubmission, SubmissionPhase},
};
use attexe_signer::Participant;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RoundDriverConfig {
    /// Skip the commit, reveal and signature submission phases.
    pub skip_submit: bool,
    /// Skip finalization, independently of `skip_submit`.
    pub skip_finalize: bool,
    /// Reveal window start, relative to the round start.
    pub reveal_offset: Duration,
    pub protocol_id: u8,
}

impl Default for RoundDriverConfig {
    fn default() -> Self {
        Self {
            skip_submit: false,
            skip_finalize: false,
            reveal_offset: Duration::from_secs(5),
            protocol_id: 100,
        }
    }
}

pub struct VotingRoundDriver {
    ctx: ProtocolContext,
    config: RoundDriverConfig,
    engine: FinalizationEngine,
}

impl VotingRoundDriver {
    pub fn new(ctx: ProtocolContext, config: RoundDriverConfig) -> Self {
        let engine = FinalizationEngine::new(ctx.clone(), config.protocol_id);

        Self {
            ctx,
            config,
            engine,
        }
    }

    pub async fn run_round(&self, round: VotingRoundId) -> Result<()> {
        let ctx = &self.ctx;

        wait_until(&ctx.wall, &ctx.wait, "round initialization", || {
            ctx.shared
                .ledger
                .latest_initialized_round()
                .is_some_and(|latest| latest >= round)
        })
        .await?;

        tracing::debug!(round, "round initialized, entering commit phase");

        if !self.config.skip_submit {
            self.submit_round_phase(round, SubmissionPhase::Commit).await;
        }

        let reveal_start =
            self.ctx.epochs.round_start(round) + self.config.reveal_offset.as_secs();
        ctx.wall.sleep_until(reveal_start).await;

        if !self.config.skip_submit {
            self.submit_round_phase(round, SubmissionPhase::Reveal).await;
        }

        let signature_deadline = reveal_start + ctx.epochs.round_duration().as_secs() / 2;
        ctx.wall.sleep_until(signature_deadline).await;

        if !self.config.skip_submit {
            self.submit_signatures(round).await;
        }

        if !self.config.skip_finalize {
            // A missed finalization must not stop the next rounds.
            if let Err(err) = self.engine.finalize_round(round).await {
                tracing::warn!(round, "finalization failed: {err:#}");
            }
        }

        tracing::info!(round, "voting round finished");

        Ok(())
    }

    async fn submit_round_phase(&self, round: VotingRoundId, phase: SubmissionPhase) {
        let ctx = &self.ctx;

        for participant in ctx.participants.iter() {
            let identity = participant.identity_address();

            let submission = RoundSubmission {
                phase,
                voting_round_id: round,
                payload: submission_payload(participant, round, phase),
            };

            let signed = match participant.keys().submit.sign(&ctx.signer, submission) {
                Ok(signed) => signed,
                Err(err) => {
                    tracing::warn!(%identity, round, ?phase, "failed to sign submission: {err:#}");
                    continue;
                }
            };

            let result = match phase {
                SubmissionPhase::Commit => ctx.authority.submit_commit(signed).await,
                SubmissionPhase::Reveal => ctx.authority.submit_reveal(signed).await,
            };

            if let Err(err) = result {
                tracing::warn!(%identity, round, ?phase, "submission failed: {err:#}");
            }
        }
    }

    async fn submit_signatures(&self, round: VotingRoundId) {
        let ctx = &self.ctx;

        let message = match self.engine.build_message(round).await {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(round, "cannot build round message: {err:#}");
                return;
            }
        };
        let message_digest = message.to_digest();

        for participant in ctx.participants.iter() {
            let identity = participant.identity_address();

            let submission = SignatureSubmission {
                voting_round_id: round,
                message_digest,
            };

            let signed = match participant
                .keys()
                .submit_signatures
                .sign(&ctx.signer, submission)
            {
                Ok(signed) => signed,
                Err(err) => {
                    tracing::warn!(%identity, round, "failed to sign round signature: {err:#}");
                    continue;
                }
            };

            if let Err(err) = ctx.authority.submit_signatures(signed).await {
                tracing::warn!(%identity, round, "signature submission failed: {err:#}");
            }
        }
    }
}

#[async_trait]
impl EpochTask for VotingRoundDriver {
    fn name(&self) -> &'static str {
        "voting-round-driver"
    }

    async fn run(&mut self, now: Timestamp) -> Result<Option<Timestamp>> {
        let round = self.ctx.epochs.voting_round_at(now);

        // A failed round (even a timed-out initialization wait) must not
        // stop the driver from proceeding to the next round.
        if let Err(err) = self.run_round(round).await {
            tracing::error!(round, "voting round failed: {err:#}");
        }

        Ok(Some(self.ctx.epochs.next_round_start(self.ctx.wall.now())))
    }
}

/// Deterministic opaque payload for the commit/reveal phases.
fn submission_payload(
    participant: &Participant,
    round: VotingRoundId,
    phase: SubmissionPhase,
) -> Vec<u8> {
    let mut data = participant.identity_address().0.to_vec();
    data.extend_from_slice(&round.to_be_bytes());
    data.push(matches!(phase, SubmissionPhase::Reveal) as u8);

    keccak256(&data).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;
    use attexe_authority::SubmissionKind;

    #[tokio::test(start_paused = true)]
    async fn full_round_submits_and_finalizes() {
        let env = TestEnv::new(3);
        let watcher = env.spawn_watcher();

        let driver = VotingRoundDriver::new(env.ctx.clone(), RoundDriverConfig::default());
        driver.run_round(0).await.unwrap();

        assert_eq!(env.authority.submitters(0, SubmissionKind::Commit).len(), 3);
        assert_eq!(env.authority.submitters(0, SubmissionKind::Reveal).len(), 3);
        assert_eq!(
            env.authority
                .submitters(0, SubmissionKind::Signatures)
                .len(),
            3
        );
        assert_eq!(env.authority.finalized_rounds(), vec![0]);

        watcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn submissions_use_role_keys() {
        let env = TestEnv::new(1);
        let watcher = env.spawn_watcher();

        let driver = VotingRoundDriver::new(env.ctx.clone(), RoundDriverConfig::default());
        driver.run_round(0).await.unwrap();

        let keys = env.participants[0].keys();
        assert_eq!(
            env.authority.submitters(0, SubmissionKind::Commit),
            vec![keys.submit.address()]
        );
        assert_eq!(
            env.authority.submitters(0, SubmissionKind::Signatures),
            vec![keys.submit_signatures.address()]
        );

        watcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn skip_submit_still_finalizes() {
        let env = TestEnv::new(3);
        let watcher = env.spawn_watcher();

        let config = RoundDriverConfig {
            skip_submit: true,
            ..Default::default()
        };
        let driver = VotingRoundDriver::new(env.ctx.clone(), config);
        driver.run_round(0).await.unwrap();

        assert!(env.authority.submitters(0, SubmissionKind::Commit).is_empty());
        assert!(env.authority.submitters(0, SubmissionKind::Reveal).is_empty());
        assert!(
            env.authority
                .submitters(0, SubmissionKind::Signatures)
                .is_empty()
        );
        assert_eq!(env.authority.finalized_rounds(), vec![0]);

        watcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn skip_finalize_is_independent() {
        let env = TestEnv::new(3);
        let watcher = env.spawn_watcher();

        let config = RoundDriverConfig {
            skip_finalize: true,
            ..Default::default()
        };
        let driver = VotingRoundDriver::new(env.ctx.clone(), config);
        driver.run_round(0).await.unwrap();

        assert_eq!(env.authority.submitters(0, SubmissionKind::Commit).len(), 3);
        assert!(env.authority.finalized_rounds().is_empty());

        watcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn phase_deadlines_follow_the_round_window() {
        let env = TestEnv::new(1);
        let watcher = env.spawn_watcher();

        let driver = VotingRoundDriver::new(env.ctx.clone(), RoundDriverConfig::default());
        driver.run_round(0).await.unwrap();

        // Reveal at T0+5, signatures at T0+15 for a 20s round.
        assert!(env.wall.now() >= T0 + 15);
        assert!(env.wall.now() < T0 + 20);

        watcher.abort();
    }
}
