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

//! Signing policies and the protocol data signed under them.

use crate::{Address, Digest, RewardEpochId, ToDigest, VotingRoundId};
use parity_scale_codec::{Decode, Encode};
use sha3::Digest as _;

/// One entry of a signing policy's voter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct PolicyVoter {
    pub address: Address,
    pub weight: u16,
}

/// The ratified, weighted voter set authorized to sign attestations
/// for one reward epoch.
///
/// The order of `voters` is protocol-authoritative: signatures collected for
/// a finalization must follow it exactly.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SigningPolicy {
    pub reward_epoch_id: RewardEpochId,
    /// First voting round this policy applies to.
    pub start_voting_round_id: VotingRoundId,
    /// Minimum cumulative voter weight required to finalize.
    pub threshold: u32,
    /// Epoch randomness acquired during the handoff.
    pub seed: Digest,
    pub voters: Vec<PolicyVoter>,
}

impl SigningPolicy {
    pub fn total_weight(&self) -> u32 {
        self.voters
            .iter()
            .fold(0u32, |acc, voter| acc.saturating_add(voter.weight.into()))
    }

    /// Position of `address` in the authoritative voter order.
    pub fn voter_index(&self, address: Address) -> Option<usize> {
        self.voters
            .iter()
            .position(|voter| voter.address == address)
    }
}

impl ToDigest for SigningPolicy {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        // To avoid missing incorrect hashing while developing.
        let Self {
            reward_epoch_id,
            start_voting_round_id,
            threshold,
            seed,
            voters,
        } = self;

        hasher.update(reward_epoch_id.to_be_bytes());
        hasher.update(start_voting_round_id.to_be_bytes());
        hasher.update(threshold.to_be_bytes());
        hasher.update(seed);
        for PolicyVoter { address, weight } in voters {
            hasher.update(address);
            hasher.update(weight.to_be_bytes());
        }
    }
}

/// The content being attested for one voting round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ProtocolMessage {
    pub protocol_id: u8,
    pub voting_round_id: VotingRoundId,
    /// Whether the round randomness is of acceptable quality.
    pub secure_random: bool,
    /// Merkle root of the round result.
    pub merkle_root: Digest,
}

impl ToDigest for ProtocolMessage {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            protocol_id,
            voting_round_id,
            secure_random,
            merkle_root,
        } = self;

        hasher.update([*protocol_id]);
        hasher.update(voting_round_id.to_be_bytes());
        hasher.update([*secure_random as u8]);
        hasher.update(merkle_root);
    }
}

/// Role-separated addresses a voter registers for a reward epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct VoterRegistration {
    pub reward_epoch_id: RewardEpochId,
    pub identity: Address,
    pub submit: Address,
    pub submit_signatures: Address,
    pub policy_signer: Address,
}

impl ToDigest for VoterRegistration {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            reward_epoch_id,
            identity,
            submit,
            submit_signatures,
            policy_signer,
        } = self;

        hasher.update(reward_epoch_id.to_be_bytes());
        hasher.update(identity);
        hasher.update(submit);
        hasher.update(submit_signatures);
        hasher.update(policy_signer);
    }
}

/// A voter's acknowledgment of the next epoch's signing policy hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct PolicyRatification {
    pub reward_epoch_id: RewardEpochId,
    pub policy_hash: Digest,
}

impl ToDigest for PolicyRatification {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            reward_epoch_id,
            policy_hash,
        } = self;

        hasher.update(reward_epoch_id.to_be_bytes());
        hasher.update(policy_hash);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum SubmissionPhase {
    Commit,
    Reveal,
}

/// An opaque first- or second-phase round submission.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RoundSubmission {
    pub phase: SubmissionPhase,
    pub voting_round_id: VotingRoundId,
    pub payload: Vec<u8>,
}

impl ToDigest for RoundSubmission {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            phase,
            voting_round_id,
            payload,
        } = self;

        hasher.update([matches!(phase, SubmissionPhase::Reveal) as u8]);
        hasher.update(voting_round_id.to_be_bytes());
        hasher.update(payload);
    }
}

/// A voter's signature-phase submission binding it to the round result digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SignatureSubmission {
    pub voting_round_id: VotingRoundId,
    pub message_digest: Digest,
}

impl ToDigest for SignatureSubmission {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            voting_round_id,
            message_digest,
        } = self;

        hasher.update(voting_round_id.to_be_bytes());
        hasher.update(message_digest);
    }
}

/// A reward offer for an upcoming reward epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RewardOffer {
    pub amount: u128,
    pub claim_back: Address,
}
