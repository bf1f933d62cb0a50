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

//! Pure time arithmetic between wall-clock timestamps and epoch/round indices.

use crate::{RewardEpochId, Timestamp, VotingRoundId};
use std::time::Duration;

/// Protocol timing parameters reported by the authority at genesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochConfig {
    /// Timestamp at which voting round 0 starts.
    pub first_round_start: Timestamp,
    /// Duration of one voting round, seconds.
    pub round_duration_secs: u64,
    /// Voting round at which reward epoch 0 starts.
    pub first_reward_epoch_start_round: VotingRoundId,
    /// Number of voting rounds per reward epoch.
    pub rounds_per_reward_epoch: u64,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EpochConfigError {
    #[error("voting round duration must be positive")]
    ZeroRoundDuration,
    #[error("reward epoch must span a positive number of voting rounds")]
    ZeroEpochSpan,
}

/// Timestamp ⇄ (reward epoch, voting round) conversions.
///
/// Stateless and immutable after construction. Timestamps before the first
/// round start saturate to round 0 (likewise for reward epochs).
#[derive(Clone, Copy, Debug)]
pub struct EpochClock {
    config: EpochConfig,
}

impl EpochClock {
    pub fn new(config: EpochConfig) -> Result<Self, EpochConfigError> {
        if config.round_duration_secs == 0 {
            return Err(EpochConfigError::ZeroRoundDuration);
        }

        if config.rounds_per_reward_epoch == 0 {
            return Err(EpochConfigError::ZeroEpochSpan);
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &EpochConfig {
        &self.config
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.config.round_duration_secs)
    }

    /// Voting round active at `timestamp`.
    pub fn voting_round_at(&self, timestamp: Timestamp) -> VotingRoundId {
        timestamp.saturating_sub(self.config.first_round_start) / self.config.round_duration_secs
    }

    /// Reward epoch active at `timestamp`.
    pub fn reward_epoch_at(&self, timestamp: Timestamp) -> RewardEpochId {
        self.reward_epoch_of_round(self.voting_round_at(timestamp))
    }

    /// Reward epoch owning the voting round.
    pub fn reward_epoch_of_round(&self, round: VotingRoundId) -> RewardEpochId {
        round.saturating_sub(self.config.first_reward_epoch_start_round)
            / self.config.rounds_per_reward_epoch
    }

    /// Start timestamp of the voting round.
    pub fn round_start(&self, round: VotingRoundId) -> Timestamp {
        self.config.first_round_start + round * self.config.round_duration_secs
    }

    /// Start timestamp of the voting round following the one active at `timestamp`.
    pub fn next_round_start(&self, timestamp: Timestamp) -> Timestamp {
        self.round_start(self.voting_round_at(timestamp) + 1)
    }

    /// First voting round of the reward epoch.
    pub fn first_round_of(&self, epoch: RewardEpochId) -> VotingRoundId {
        self.config.first_reward_epoch_start_round + epoch * self.config.rounds_per_reward_epoch
    }

    /// Start timestamp of the reward epoch.
    pub fn reward_epoch_start(&self, epoch: RewardEpochId) -> Timestamp {
        self.round_start(self.first_round_of(epoch))
    }

    /// Start timestamp of the reward epoch following the one active at `timestamp`.
    pub fn next_reward_epoch_start(&self, timestamp: Timestamp) -> Timestamp {
        self.reward_epoch_start(self.reward_epoch_at(timestamp) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_700_000_000;

    fn clock() -> EpochClock {
        // Reward epoch of 100s split into 20s voting rounds.
        EpochClock::new(EpochConfig {
            first_round_start: T0,
            round_duration_secs: 20,
            first_reward_epoch_start_round: 0,
            rounds_per_reward_epoch: 5,
        })
        .unwrap()
    }

    #[test]
    fn rejects_malformed_config() {
        let mut config = *clock().config();
        config.round_duration_secs = 0;
        assert_eq!(
            EpochClock::new(config).unwrap_err(),
            EpochConfigError::ZeroRoundDuration
        );

        let mut config = *clock().config();
        config.rounds_per_reward_epoch = 0;
        assert_eq!(
            EpochClock::new(config).unwrap_err(),
            EpochConfigError::ZeroEpochSpan
        );
    }

    #[test]
    fn end_to_end_scenario() {
        let clock = clock();

        assert_eq!(clock.voting_round_at(T0 + 45), 2);
        assert_eq!(clock.reward_epoch_at(T0 + 45), 0);

        assert_eq!(clock.voting_round_at(T0 + 105), 5);
        assert_eq!(clock.reward_epoch_at(T0 + 105), 1);
    }

    #[test]
    fn round_bounds_hold() {
        let clock = clock();

        for t in T0..T0 + 500 {
            let round = clock.voting_round_at(t);
            assert!(clock.round_start(round) <= t);
            assert!(t < clock.round_start(round + 1));
        }
    }

    #[test]
    fn indices_are_monotonic() {
        let clock = clock();

        let mut prev_round = clock.voting_round_at(T0);
        let mut prev_epoch = clock.reward_epoch_at(T0);
        let mut increments = 0;

        for t in T0 + 1..T0 + 200 {
            let round = clock.voting_round_at(t);
            let epoch = clock.reward_epoch_at(t);

            assert!(round >= prev_round);
            assert!(epoch >= prev_epoch);

            if round > prev_round {
                assert_eq!(round, prev_round + 1);
                increments += 1;
            }

            prev_round = round;
            prev_epoch = epoch;
        }

        // One increment per round duration over the scanned range.
        assert_eq!(increments, 199 / 20);
    }

    #[test]
    fn pre_genesis_saturates() {
        let clock = clock();

        assert_eq!(clock.voting_round_at(T0 - 1), 0);
        assert_eq!(clock.reward_epoch_at(0), 0);
    }

    #[test]
    fn epoch_boundaries() {
        let clock = clock();

        assert_eq!(clock.first_round_of(2), 10);
        assert_eq!(clock.reward_epoch_start(2), T0 + 200);
        assert_eq!(clock.next_reward_epoch_start(T0 + 45), T0 + 100);
        assert_eq!(clock.next_round_start(T0 + 45), T0 + 60);
        assert_eq!(clock.reward_epoch_of_round(12), 2);
    }
}
