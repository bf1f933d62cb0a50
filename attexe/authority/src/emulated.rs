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

//! In-memory authority emulation.
//!
//! Advances a per-epoch phase script on each heartbeat and validates
//! submissions the way the real authority would: recovered signer addresses
//! are checked against registrations and policies, relay payloads are checked
//! for policy-ordered signatures meeting the threshold.

use crate::{Authority, Heartbeat, PolicySignAck, SignedFinalization};
use anyhow::{Result, anyhow, bail, ensure};
use async_trait::async_trait;
use attexe_common::{
    Address, Digest, RewardEpochId, ToDigest, VotingRoundId,
    epochs::EpochClock,
    events::{
        InflationRewardsOffered, LedgerEvent, RandomAcquisitionStarted, RewardEpochStarted,
        SigningPolicyInitialized, SigningPolicySigned, TransitionLog, VotePowerBlockSelected,
        VotingRoundInitialized,
    },
    keccak256,
    policy::{
        PolicyRatification, PolicyVoter, RewardOffer, RoundSubmission, SignatureSubmission,
        SigningPolicy, SubmissionPhase, VoterRegistration,
    },
    time::WallClock,
};
use attexe_signer::SignedData;
use parity_scale_codec::Decode;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

/// Phase script offsets within a reward epoch, seconds after epoch start.
#[derive(Clone, Debug)]
pub struct EmulatedConfig {
    pub random_acquisition_delay: u64,
    pub vote_power_delay: u64,
    pub policy_publish_delay: u64,
    /// Randomness quality the authority reports.
    pub good_randomness: bool,
    /// Vote-power weights assigned to registered voters, cycled in
    /// registration order.
    pub voter_weights: Vec<u16>,
    /// Fixed ratification/finalization threshold; majority of the total
    /// weight when unset.
    pub policy_threshold: Option<u32>,
}

impl Default for EmulatedConfig {
    fn default() -> Self {
        Self {
            random_acquisition_delay: 5,
            vote_power_delay: 10,
            policy_publish_delay: 20,
            good_randomness: true,
            voter_weights: vec![1],
            policy_threshold: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct EpochPhases {
    random_acquisition: bool,
    vote_power: bool,
    policy_published: bool,
}

/// Counted phase submissions, for test assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubmissionKind {
    Commit,
    Reveal,
    Signatures,
}

#[derive(Debug, Default)]
struct Inner {
    started_epochs: BTreeSet<RewardEpochId>,
    phases: BTreeMap<RewardEpochId, EpochPhases>,
    last_initialized_round: Option<VotingRoundId>,
    registrations: BTreeMap<RewardEpochId, Vec<VoterRegistration>>,
    policies: BTreeMap<RewardEpochId, SigningPolicy>,
    ratified_by: BTreeMap<RewardEpochId, BTreeSet<Address>>,
    ratified_weight: BTreeMap<RewardEpochId, u32>,
    submissions: BTreeMap<(VotingRoundId, SubmissionKind), Vec<Address>>,
    finalized: BTreeMap<VotingRoundId, Digest>,
    offers: BTreeMap<RewardEpochId, Vec<RewardOffer>>,
    pending: Vec<TransitionLog>,
    fail_heartbeats: u32,
}

pub struct EmulatedAuthority {
    epochs: EpochClock,
    wall: WallClock,
    config: EmulatedConfig,
    inner: Mutex<Inner>,
}

impl EmulatedAuthority {
    /// Create the authority with the epoch-0 signing policy installed.
    pub fn new(
        epochs: EpochClock,
        wall: WallClock,
        genesis_policy: SigningPolicy,
        config: EmulatedConfig,
    ) -> Self {
        let mut inner = Inner::default();
        inner
            .policies
            .insert(genesis_policy.reward_epoch_id, genesis_policy);

        Self {
            epochs,
            wall,
            config,
            inner: Mutex::new(inner),
        }
    }

    /// Make the next `count` heartbeat calls fail, to exercise watcher
    /// resilience.
    pub fn inject_heartbeat_failures(&self, count: u32) {
        self.inner.lock().fail_heartbeats = count;
    }

    pub fn finalized_rounds(&self) -> Vec<VotingRoundId> {
        self.inner.lock().finalized.keys().copied().collect()
    }

    pub fn policy(&self, epoch: RewardEpochId) -> Option<SigningPolicy> {
        self.inner.lock().policies.get(&epoch).cloned()
    }

    pub fn registration_count(&self, epoch: RewardEpochId) -> usize {
        self.inner
            .lock()
            .registrations
            .get(&epoch)
            .map_or(0, Vec::len)
    }

    pub fn ratified_weight(&self, epoch: RewardEpochId) -> u32 {
        self.inner
            .lock()
            .ratified_weight
            .get(&epoch)
            .copied()
            .unwrap_or(0)
    }

    pub fn submitters(&self, round: VotingRoundId, kind: SubmissionKind) -> Vec<Address> {
        self.inner
            .lock()
            .submissions
            .get(&(round, kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn offers(&self, epoch: RewardEpochId) -> Vec<RewardOffer> {
        self.inner
            .lock()
            .offers
            .get(&epoch)
            .cloned()
            .unwrap_or_default()
    }

    fn push_event(inner: &mut Inner, event: impl Into<LedgerEvent>) {
        inner.pending.push(event.into().to_log());
    }

    /// Emit the time-driven part of the phase script up to `now`.
    fn advance_script(&self, inner: &mut Inner) {
        let now = self.wall.now();
        let current_epoch = self.epochs.reward_epoch_at(now);
        let epoch_start = self.epochs.reward_epoch_start(current_epoch);

        for epoch in 0..=current_epoch {
            if inner.started_epochs.insert(epoch) {
                Self::push_event(
                    inner,
                    RewardEpochStarted {
                        reward_epoch_id: epoch,
                    },
                );
            }
        }

        let mut phases = inner.phases.get(&current_epoch).copied().unwrap_or_default();

        if !phases.random_acquisition && now >= epoch_start + self.config.random_acquisition_delay {
            phases.random_acquisition = true;
            Self::push_event(
                inner,
                RandomAcquisitionStarted {
                    reward_epoch_id: current_epoch,
                },
            );
        }

        if phases.random_acquisition
            && !phases.vote_power
            && now >= epoch_start + self.config.vote_power_delay
        {
            phases.vote_power = true;
            Self::push_event(
                inner,
                VotePowerBlockSelected {
                    reward_epoch_id: current_epoch,
                    vote_power_block: now,
                },
            );
        }

        let next_epoch = current_epoch + 1;
        if phases.vote_power
            && !phases.policy_published
            && now >= epoch_start + self.config.policy_publish_delay
            && inner
                .registrations
                .get(&next_epoch)
                .is_some_and(|registrations| !registrations.is_empty())
        {
            phases.policy_published = true;
            let policy = self.build_policy(inner, next_epoch);
            inner.policies.insert(next_epoch, policy.clone());
            Self::push_event(inner, SigningPolicyInitialized { policy });
        }

        inner.phases.insert(current_epoch, phases);

        let round_now = self.epochs.voting_round_at(now);
        let first_unannounced = inner
            .last_initialized_round
            .map_or(0, |round| round + 1);
        for round in first_unannounced..=round_now {
            Self::push_event(
                inner,
                VotingRoundInitialized {
                    voting_round_id: round,
                },
            );
        }
        inner.last_initialized_round = Some(round_now);
    }

    fn build_policy(&self, inner: &Inner, epoch: RewardEpochId) -> SigningPolicy {
        let registrations = inner
            .registrations
            .get(&epoch)
            .expect("checked by the caller");

        let voters: Vec<_> = registrations
            .iter()
            .enumerate()
            .map(|(index, registration)| PolicyVoter {
                address: registration.policy_signer,
                weight: self.config.voter_weights[index % self.config.voter_weights.len()],
            })
            .collect();

        let total: u32 = voters
            .iter()
            .fold(0u32, |acc, voter| acc.saturating_add(voter.weight.into()));
        let threshold = self.config.policy_threshold.unwrap_or(total / 2 + 1);

        let mut seed_data = epoch.to_be_bytes().to_vec();
        seed_data.extend_from_slice(b"epoch seed");

        SigningPolicy {
            reward_epoch_id: epoch,
            start_voting_round_id: self.epochs.first_round_of(epoch),
            threshold,
            seed: keccak256(&seed_data).into(),
            voters,
        }
    }
}

#[async_trait]
impl Authority for EmulatedAuthority {
    async fn heartbeat(&self) -> Result<Heartbeat> {
        let mut inner = self.inner.lock();

        if inner.fail_heartbeats > 0 {
            inner.fail_heartbeats -= 1;
            bail!("emulated transport failure");
        }

        self.advance_script(&mut inner);

        Ok(Heartbeat {
            block_timestamp: self.wall.now(),
            logs: std::mem::take(&mut inner.pending),
        })
    }

    async fn current_reward_epoch(&self) -> Result<RewardEpochId> {
        Ok(self.epochs.reward_epoch_at(self.wall.now()))
    }

    async fn randomness_quality(&self) -> Result<bool> {
        Ok(self.config.good_randomness)
    }

    async fn register_voter(&self, registration: SignedData<VoterRegistration>) -> Result<()> {
        let signer = registration.address()?;
        let data = *registration.data();

        ensure!(
            signer == data.policy_signer,
            "registration must be signed by the registered signing-policy key"
        );

        let mut inner = self.inner.lock();
        let registrations = inner.registrations.entry(data.reward_epoch_id).or_default();

        // Re-registration replaces the previous record for the identity.
        if let Some(existing) = registrations
            .iter_mut()
            .find(|existing| existing.identity == data.identity)
        {
            *existing = data;
        } else {
            registrations.push(data);
        }

        Ok(())
    }

    async fn policy_hash(&self, reward_epoch_id: RewardEpochId) -> Result<Digest> {
        self.inner
            .lock()
            .policies
            .get(&reward_epoch_id)
            .map(ToDigest::to_digest)
            .ok_or_else(|| anyhow!("no signing policy initialized for epoch {reward_epoch_id}"))
    }

    async fn sign_policy(
        &self,
        ratification: SignedData<PolicyRatification>,
    ) -> Result<PolicySignAck> {
        let signer = ratification.address()?;
        let data = *ratification.data();
        let epoch = data.reward_epoch_id;

        let mut inner = self.inner.lock();

        let Some(policy) = inner.policies.get(&epoch).cloned() else {
            return Ok(PolicySignAck {
                acknowledged: false,
                threshold_reached: false,
            });
        };

        let Some(index) = policy.voter_index(signer) else {
            return Ok(PolicySignAck {
                acknowledged: false,
                threshold_reached: false,
            });
        };

        if data.policy_hash != policy.to_digest() {
            return Ok(PolicySignAck {
                acknowledged: false,
                threshold_reached: false,
            });
        }

        let weight = if inner.ratified_by.entry(epoch).or_default().insert(signer) {
            policy.voters[index].weight.into()
        } else {
            0
        };

        let cumulative = inner.ratified_weight.entry(epoch).or_insert(0);
        *cumulative = cumulative.saturating_add(weight);
        let threshold_reached = *cumulative >= policy.threshold;

        Self::push_event(
            &mut inner,
            SigningPolicySigned {
                reward_epoch_id: epoch,
                signer,
                threshold_reached,
            },
        );

        Ok(PolicySignAck {
            acknowledged: true,
            threshold_reached,
        })
    }

    async fn submit_commit(&self, submission: SignedData<RoundSubmission>) -> Result<()> {
        let signer = submission.address()?;
        let data = submission.data();
        ensure!(
            data.phase == SubmissionPhase::Commit,
            "commit entry point received a {:?} submission",
            data.phase
        );

        self.inner
            .lock()
            .submissions
            .entry((data.voting_round_id, SubmissionKind::Commit))
            .or_default()
            .push(signer);

        Ok(())
    }

    async fn submit_reveal(&self, submission: SignedData<RoundSubmission>) -> Result<()> {
        let signer = submission.address()?;
        let data = submission.data();
        ensure!(
            data.phase == SubmissionPhase::Reveal,
            "reveal entry point received a {:?} submission",
            data.phase
        );

        self.inner
            .lock()
            .submissions
            .entry((data.voting_round_id, SubmissionKind::Reveal))
            .or_default()
            .push(signer);

        Ok(())
    }

    async fn submit_signatures(&self, submission: SignedData<SignatureSubmission>) -> Result<()> {
        let signer = submission.address()?;
        let data = submission.data();

        self.inner
            .lock()
            .submissions
            .entry((data.voting_round_id, SubmissionKind::Signatures))
            .or_default()
            .push(signer);

        Ok(())
    }

    async fn relay(&self, payload: Vec<u8>) -> Result<()> {
        let finalization = SignedFinalization::decode(&mut payload.as_slice())?;
        let SignedFinalization {
            policy,
            message,
            signatures,
        } = finalization;

        let digest = message.to_digest();

        let mut weight = 0u32;
        let mut last_index = None;
        for signature in &signatures {
            let signer = signature.recover_from_digest(digest)?.to_address();
            let index = policy
                .voter_index(signer)
                .ok_or_else(|| anyhow!("finalization signed by unknown voter {signer}"))?;

            // The signature list must follow the policy's voter order.
            ensure!(
                last_index.is_none_or(|last| index > last),
                "finalization signatures out of policy order"
            );
            last_index = Some(index);

            weight = weight.saturating_add(policy.voters[index].weight.into());
        }

        ensure!(
            weight >= policy.threshold,
            "finalization weight {weight} below threshold {}",
            policy.threshold
        );

        self.inner
            .lock()
            .finalized
            .insert(message.voting_round_id, digest);

        tracing::debug!(
            round = message.voting_round_id,
            weight,
            "relay accepted finalization"
        );

        Ok(())
    }

    async fn offer_rewards(
        &self,
        reward_epoch_id: RewardEpochId,
        offers: Vec<RewardOffer>,
    ) -> Result<()> {
        let amount = offers
            .iter()
            .fold(0u128, |acc, offer| acc.saturating_add(offer.amount));

        let mut inner = self.inner.lock();
        inner
            .offers
            .entry(reward_epoch_id)
            .or_default()
            .extend(offers);

        Self::push_event(
            &mut inner,
            InflationRewardsOffered {
                reward_epoch_id,
                amount,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attexe_common::epochs::EpochConfig;
    use attexe_signer::{Participant, Signer};

    const T0: u64 = 1_700_000_000;

    fn epochs() -> EpochClock {
        EpochClock::new(EpochConfig {
            first_round_start: T0,
            round_duration_secs: 20,
            first_reward_epoch_start_round: 0,
            rounds_per_reward_epoch: 5,
        })
        .unwrap()
    }

    fn genesis_policy() -> SigningPolicy {
        SigningPolicy {
            reward_epoch_id: 0,
            start_voting_round_id: 0,
            threshold: 1,
            seed: [0; 32].into(),
            voters: vec![],
        }
    }

    fn authority(wall: &WallClock) -> EmulatedAuthority {
        EmulatedAuthority::new(
            epochs(),
            wall.clone(),
            genesis_policy(),
            EmulatedConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn phase_script_emits_in_order() {
        let wall = WallClock::start_at(T0);
        let authority = authority(&wall);

        let heartbeat = authority.heartbeat().await.unwrap();
        let kinds: Vec<_> = heartbeat.logs.iter().map(|log| log.kind).collect();
        assert_eq!(
            kinds,
            vec![
                attexe_common::events::EventKind::RewardEpochStarted,
                attexe_common::events::EventKind::VotingRoundInitialized,
            ]
        );

        wall.sleep(std::time::Duration::from_secs(12)).await;
        let heartbeat = authority.heartbeat().await.unwrap();
        let kinds: Vec<_> = heartbeat.logs.iter().map(|log| log.kind).collect();
        assert_eq!(
            kinds,
            vec![
                attexe_common::events::EventKind::RandomAcquisitionStarted,
                attexe_common::events::EventKind::VotePowerBlockSelected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn policy_is_published_after_registrations() {
        let wall = WallClock::start_at(T0);
        let authority = authority(&wall);
        let signer = Signer::new();
        let participant = Participant::generate(&signer);

        let registration = participant.registration(1);
        let signed = participant
            .keys()
            .policy_signer
            .sign(&signer, registration)
            .unwrap();
        authority.register_voter(signed).await.unwrap();
        assert_eq!(authority.registration_count(1), 1);

        wall.sleep(std::time::Duration::from_secs(25)).await;
        let heartbeat = authority.heartbeat().await.unwrap();
        assert!(
            heartbeat
                .logs
                .iter()
                .any(|log| log.kind == attexe_common::events::EventKind::SigningPolicyInitialized)
        );

        let policy = authority.policy(1).expect("policy must be installed");
        assert_eq!(policy.reward_epoch_id, 1);
        assert_eq!(
            policy.voters[0].address,
            participant.keys().policy_signer.address()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn registration_with_wrong_key_is_rejected() {
        let wall = WallClock::start_at(T0);
        let authority = authority(&wall);
        let signer = Signer::new();
        let participant = Participant::generate(&signer);

        let registration = participant.registration(1);
        // Submit key must not be able to register.
        let signed = participant
            .keys()
            .submit
            .sign(&signer, registration)
            .unwrap();

        assert!(authority.register_voter(signed).await.is_err());
        assert_eq!(authority.registration_count(1), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_failures_are_injected() {
        let wall = WallClock::start_at(T0);
        let authority = authority(&wall);

        authority.inject_heartbeat_failures(1);
        assert!(authority.heartbeat().await.is_err());
        assert!(authority.heartbeat().await.is_ok());
    }
}
