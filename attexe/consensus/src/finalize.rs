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

//! Assembles and submits threshold-signed round finalizations.

use crate::ProtocolContext;
use anyhow::{Result, anyhow};
use attexe_authority::SignedFinalization;
use attexe_common::{Digest, ToDigest, VotingRoundId, keccak256, policy::ProtocolMessage};
use parity_scale_codec::Encode;

pub struct FinalizationEngine {
    ctx: ProtocolContext,
    protocol_id: u8,
}

impl FinalizationEngine {
    pub fn new(ctx: ProtocolContext, protocol_id: u8) -> Self {
        Self { ctx, protocol_id }
    }

    /// Build the attestation message for the round.
    pub async fn build_message(&self, round: VotingRoundId) -> Result<ProtocolMessage> {
        let secure_random = self.ctx.authority.randomness_quality().await?;

        Ok(ProtocolMessage {
            protocol_id: self.protocol_id,
            voting_round_id: round,
            secure_random,
            merkle_root: round_result_root(self.protocol_id, round),
        })
    }

    /// Build the finalization for the round: the active signing policy, the
    /// attestation message, and one signature per locally-known voter —
    /// strictly in the policy's voter order, whatever order the local
    /// participant list is in.
    pub async fn build_finalization(&self, round: VotingRoundId) -> Result<SignedFinalization> {
        let epoch = self.ctx.epochs.reward_epoch_of_round(round);
        let policy = self
            .ctx
            .shared
            .policies
            .get(epoch)
            .ok_or_else(|| anyhow!("no signing policy known for reward epoch {epoch}"))?;

        let message = self.build_message(round).await?;
        let digest = message.to_digest();

        let mut signatures = Vec::with_capacity(policy.voters.len());
        for voter in &policy.voters {
            let Some(participant) = self
                .ctx
                .participants
                .iter()
                .find(|participant| participant.keys().policy_signer.address() == voter.address)
            else {
                tracing::debug!(voter = %voter.address, round, "voter has no local key, assuming external");
                continue;
            };

            let signature = participant
                .keys()
                .policy_signer
                .sign_digest(&self.ctx.signer, digest)?;
            signatures.push(signature);
        }

        Ok(SignedFinalization {
            policy,
            message,
            signatures,
        })
    }

    /// Build and submit the round's finalization to the relay entry point.
    pub async fn finalize_round(&self, round: VotingRoundId) -> Result<()> {
        let finalization = self.build_finalization(round).await?;
        let signatures = finalization.signatures.len();

        self.ctx.authority.relay(finalization.encode()).await?;

        tracing::info!(round, signatures, "📦 finalization submitted");

        Ok(())
    }
}

/// Deterministic stand-in for the round's result merkle root.
fn round_result_root(protocol_id: u8, round: VotingRoundId) -> Digest {
    let mut data = vec![protocol_id];
    data.extend_from_slice(&round.to_be_bytes());
    data.extend_from_slice(b"round result");

    keccak256(&data).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;

    #[tokio::test(start_paused = true)]
    async fn signatures_follow_policy_order() {
        // Policy voters [A, B, C]; local participants hold keys for A and C
        // only, listed as [C, A].
        let env = TestEnv::with_participants(3, |participants| {
            vec![participants[2], participants[0]]
        });

        let engine = FinalizationEngine::new(env.ctx.clone(), PROTOCOL_ID);
        let finalization = engine.build_finalization(0).await.unwrap();

        let digest = finalization.message.to_digest();
        let signers: Vec<_> = finalization
            .signatures
            .iter()
            .map(|signature| {
                signature
                    .recover_from_digest(digest)
                    .unwrap()
                    .to_address()
            })
            .collect();

        assert_eq!(
            signers,
            vec![
                env.participants[0].keys().policy_signer.address(),
                env.participants[2].keys().policy_signer.address(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ordering_is_invariant_under_local_permutation() {
        let env = TestEnv::with_participants(3, |participants| {
            vec![participants[1], participants[2], participants[0]]
        });
        let permuted = FinalizationEngine::new(env.ctx.clone(), PROTOCOL_ID)
            .build_finalization(0)
            .await
            .unwrap();

        let plain_env = TestEnv::new(3);
        let plain = FinalizationEngine::new(plain_env.ctx.clone(), PROTOCOL_ID)
            .build_finalization(0)
            .await
            .unwrap();

        // Both environments share the deterministic message, and the
        // signature count matches regardless of local list order.
        assert_eq!(permuted.signatures.len(), 3);
        assert_eq!(plain.signatures.len(), 3);
        assert_eq!(permuted.message, plain.message);
    }

    #[tokio::test(start_paused = true)]
    async fn relay_accepts_threshold_finalization() {
        let env = TestEnv::new(3);

        let engine = FinalizationEngine::new(env.ctx.clone(), PROTOCOL_ID);
        engine.finalize_round(0).await.unwrap();

        assert_eq!(env.authority.finalized_rounds(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_policy_is_an_error() {
        let env = TestEnv::new(2);

        let engine = FinalizationEngine::new(env.ctx.clone(), PROTOCOL_ID);
        // Round 10 belongs to reward epoch 2, for which no policy is known.
        assert!(engine.finalize_round(10).await.is_err());
        assert!(env.authority.finalized_rounds().is_empty());
    }
}
