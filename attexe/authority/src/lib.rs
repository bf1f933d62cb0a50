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

//! The protocol authority boundary.
//!
//! The authority owns ground-truth phase state and validates signatures and
//! thresholds; the services in this repository only drive and observe it
//! through the small RPC-like [`Authority`] interface. The in-process
//! [`EmulatedAuthority`] stands in for it in simulations and tests.

mod emulated;

pub use emulated::{EmulatedAuthority, EmulatedConfig, SubmissionKind};

use anyhow::Result;
use async_trait::async_trait;
use attexe_common::{
    Digest, RewardEpochId, Timestamp, ToDigest,
    events::TransitionLog,
    policy::{
        PolicyRatification, ProtocolMessage, RewardOffer, RoundSubmission, SignatureSubmission,
        SigningPolicy, VoterRegistration,
    },
};
use attexe_signer::{Signature, SignedData};
use parity_scale_codec::{Decode, Encode};
use sha3::Digest as _;

/// Result of one heartbeat invocation: zero or more emitted transition
/// events and the authority-side block timestamp they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    pub block_timestamp: Timestamp,
    pub logs: Vec<TransitionLog>,
}

/// The authority's response to a signing policy ratification submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicySignAck {
    /// Whether the signature was accepted as a policy ratification.
    pub acknowledged: bool,
    /// Whether the cumulative ratification weight has reached the threshold.
    pub threshold_reached: bool,
}

/// A submittable threshold attestation for one voting round.
///
/// `signatures` holds one signature per present voter, ordered exactly by the
/// policy's voter list; absent voters simply contribute nothing.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SignedFinalization {
    pub policy: SigningPolicy,
    pub message: ProtocolMessage,
    pub signatures: Vec<Signature>,
}

impl ToDigest for SignedFinalization {
    fn update_hasher(&self, hasher: &mut sha3::Keccak256) {
        let Self {
            policy,
            message,
            signatures,
        } = self;

        hasher.update(policy.to_digest());
        hasher.update(message.to_digest());
        for signature in signatures {
            hasher.update(signature);
        }
    }
}

/// The black-box protocol authority.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Advance/observe authority-side phase state; may emit zero or more
    /// transition events per call.
    async fn heartbeat(&self) -> Result<Heartbeat>;

    async fn current_reward_epoch(&self) -> Result<RewardEpochId>;

    /// Whether the acquired protocol randomness is of acceptable quality.
    async fn randomness_quality(&self) -> Result<bool>;

    /// Register a voter for the epoch named in the registration. Must be
    /// signed by the registered signing-policy key.
    async fn register_voter(&self, registration: SignedData<VoterRegistration>) -> Result<()>;

    /// Hash representing the epoch's signing policy, as the authority
    /// expects it to be ratified.
    async fn policy_hash(&self, reward_epoch_id: RewardEpochId) -> Result<Digest>;

    /// Submit a ratification signature for an initialized signing policy.
    async fn sign_policy(&self, ratification: SignedData<PolicyRatification>)
    -> Result<PolicySignAck>;

    /// First-phase (commit) round submission.
    async fn submit_commit(&self, submission: SignedData<RoundSubmission>) -> Result<()>;

    /// Second-phase (reveal) round submission.
    async fn submit_reveal(&self, submission: SignedData<RoundSubmission>) -> Result<()>;

    /// Signature-phase round submission.
    async fn submit_signatures(&self, submission: SignedData<SignatureSubmission>) -> Result<()>;

    /// Submit an encoded [`SignedFinalization`] to the relay entry point.
    async fn relay(&self, payload: Vec<u8>) -> Result<()>;

    /// Post reward offers for the given reward epoch.
    async fn offer_rewards(
        &self,
        reward_epoch_id: RewardEpochId,
        offers: Vec<RewardOffer>,
    ) -> Result<()>;
}
