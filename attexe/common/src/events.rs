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

//! Phase-transition events emitted by the authority.
//!
//! The authority reports raw [`TransitionLog`]s from its heartbeat operation;
//! [`LedgerEvent::decode_log`] is the single place where they are decoded into
//! typed events. Only the name tag ([`EventKind`]) is recorded in the event
//! ledger.

use crate::{Address, RewardEpochId, VotingRoundId, policy::SigningPolicy};
use parity_scale_codec::{Decode, Encode, Error as CodecError};

/// Name tag of a phase-transition event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum EventKind {
    RandomAcquisitionStarted,
    VotePowerBlockSelected,
    SigningPolicyInitialized,
    VotingRoundInitialized,
    SigningPolicySigned,
    RewardEpochStarted,
    InflationRewardsOffered,
}

/// Raw event as emitted by the authority: a name tag and a SCALE payload.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct TransitionLog {
    pub kind: EventKind,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, derive_more::From)]
pub enum LedgerEvent {
    RandomAcquisitionStarted(RandomAcquisitionStarted),
    VotePowerBlockSelected(VotePowerBlockSelected),
    SigningPolicyInitialized(SigningPolicyInitialized),
    VotingRoundInitialized(VotingRoundInitialized),
    SigningPolicySigned(SigningPolicySigned),
    RewardEpochStarted(RewardEpochStarted),
    InflationRewardsOffered(InflationRewardsOffered),
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RandomAcquisitionStarted {
    pub reward_epoch_id: RewardEpochId,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct VotePowerBlockSelected {
    pub reward_epoch_id: RewardEpochId,
    pub vote_power_block: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SigningPolicyInitialized {
    pub policy: SigningPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct VotingRoundInitialized {
    pub voting_round_id: VotingRoundId,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SigningPolicySigned {
    pub reward_epoch_id: RewardEpochId,
    pub signer: Address,
    pub threshold_reached: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RewardEpochStarted {
    pub reward_epoch_id: RewardEpochId,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct InflationRewardsOffered {
    pub reward_epoch_id: RewardEpochId,
    pub amount: u128,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RandomAcquisitionStarted(_) => EventKind::RandomAcquisitionStarted,
            Self::VotePowerBlockSelected(_) => EventKind::VotePowerBlockSelected,
            Self::SigningPolicyInitialized(_) => EventKind::SigningPolicyInitialized,
            Self::VotingRoundInitialized(_) => EventKind::VotingRoundInitialized,
            Self::SigningPolicySigned(_) => EventKind::SigningPolicySigned,
            Self::RewardEpochStarted(_) => EventKind::RewardEpochStarted,
            Self::InflationRewardsOffered(_) => EventKind::InflationRewardsOffered,
        }
    }

    /// Decode a raw authority log into a typed event.
    pub fn decode_log(log: &TransitionLog) -> Result<Self, CodecError> {
        let mut payload = log.payload.as_slice();

        let event = match log.kind {
            EventKind::RandomAcquisitionStarted => {
                RandomAcquisitionStarted::decode(&mut payload)?.into()
            }
            EventKind::VotePowerBlockSelected => {
                VotePowerBlockSelected::decode(&mut payload)?.into()
            }
            EventKind::SigningPolicyInitialized => {
                SigningPolicyInitialized::decode(&mut payload)?.into()
            }
            EventKind::VotingRoundInitialized => {
                VotingRoundInitialized::decode(&mut payload)?.into()
            }
            EventKind::SigningPolicySigned => SigningPolicySigned::decode(&mut payload)?.into(),
            EventKind::RewardEpochStarted => RewardEpochStarted::decode(&mut payload)?.into(),
            EventKind::InflationRewardsOffered => {
                InflationRewardsOffered::decode(&mut payload)?.into()
            }
        };

        Ok(event)
    }

    /// Encode a typed event back into its raw log form.
    pub fn to_log(&self) -> TransitionLog {
        let payload = match self {
            Self::RandomAcquisitionStarted(event) => event.encode(),
            Self::VotePowerBlockSelected(event) => event.encode(),
            Self::SigningPolicyInitialized(event) => event.encode(),
            Self::VotingRoundInitialized(event) => event.encode(),
            Self::SigningPolicySigned(event) => event.encode(),
            Self::RewardEpochStarted(event) => event.encode(),
            Self::InflationRewardsOffered(event) => event.encode(),
        };

        TransitionLog {
            kind: self.kind(),
            payload,
        }
    }
}
