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

//! Authority state watcher for attexe.
//!
//! Polls the authority's heartbeat operation, decodes emitted transition
//! events and appends them to the shared [`EventLedger`]. This is the only
//! writer of the shared state; the protocol drivers read it as polling
//! snapshots.

use attexe_authority::{Authority, Heartbeat};
use attexe_common::{
    Timestamp,
    epochs::EpochClock,
    events::{LedgerEvent, TransitionLog},
    ledger::SharedState,
};
use std::{sync::Arc, time::Duration};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct LedgerWatcherConfig {
    pub poll_interval: Duration,
}

impl Default for LedgerWatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Background loop observing the authority.
///
/// Runs at a fixed poll cadence for the life of the process; heartbeat
/// failures are logged and the loop continues at the next interval.
pub struct LedgerWatcher {
    authority: Arc<dyn Authority>,
    shared: Arc<SharedState>,
    epochs: EpochClock,
    config: LedgerWatcherConfig,
}

impl LedgerWatcher {
    pub fn new(
        authority: Arc<dyn Authority>,
        shared: Arc<SharedState>,
        epochs: EpochClock,
        config: LedgerWatcherConfig,
    ) -> Self {
        Self {
            authority,
            shared,
            epochs,
            config,
        }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match self.authority.heartbeat().await {
                Ok(heartbeat) => self.process_heartbeat(heartbeat),
                Err(err) => tracing::warn!("authority heartbeat failed: {err:#}"),
            }
        }
    }

    fn process_heartbeat(&self, heartbeat: Heartbeat) {
        let Heartbeat {
            block_timestamp,
            logs,
        } = heartbeat;

        for log in logs {
            self.process_log(block_timestamp, &log);
        }
    }

    /// Decode one raw log and route it into the shared state.
    ///
    /// Epoch and round attribution goes through the epoch clock on the
    /// block timestamp the event was emitted at.
    fn process_log(&self, block_timestamp: Timestamp, log: &TransitionLog) {
        let event = match LedgerEvent::decode_log(log) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(kind = ?log.kind, "undecodable transition event: {err}");
                return;
            }
        };

        tracing::trace!(?event, block_timestamp, "observed transition event");

        match event {
            LedgerEvent::VotingRoundInitialized(initialized) => {
                let round = self.epochs.voting_round_at(block_timestamp);
                if round != initialized.voting_round_id {
                    tracing::debug!(
                        announced = initialized.voting_round_id,
                        derived = round,
                        "round initialization outside its round window",
                    );
                }

                self.shared.ledger.mark_round_initialized(round);
            }
            LedgerEvent::SigningPolicyInitialized(initialized) => {
                let epoch = self.epochs.reward_epoch_at(block_timestamp);

                tracing::info!(
                    epoch = initialized.policy.reward_epoch_id,
                    voters = initialized.policy.voters.len(),
                    threshold = initialized.policy.threshold,
                    "🔏 new signing policy observed",
                );

                self.shared.policies.install(initialized.policy);
                self.shared.ledger.record_event(epoch, log.kind);
            }
            event => {
                let epoch = self.epochs.reward_epoch_at(block_timestamp);
                self.shared.ledger.record_event(epoch, event.kind());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attexe_authority::{EmulatedAuthority, EmulatedConfig};
    use attexe_common::{
        epochs::EpochConfig,
        events::{EventKind, SigningPolicyInitialized, VotingRoundInitialized},
        policy::SigningPolicy,
        time::WallClock,
    };

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

    fn watcher(shared: Arc<SharedState>, authority: Arc<dyn Authority>) -> LedgerWatcher {
        LedgerWatcher::new(authority, shared, epochs(), LedgerWatcherConfig::default())
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

    #[tokio::test(start_paused = true)]
    async fn routes_events_into_shared_state() {
        let shared = Arc::new(SharedState::new());
        let wall = WallClock::start_at(T0);
        let authority = Arc::new(EmulatedAuthority::new(
            epochs(),
            wall.clone(),
            genesis_policy(),
            EmulatedConfig::default(),
        ));
        let watcher = watcher(shared.clone(), authority.clone());

        wall.sleep(Duration::from_secs(12)).await;
        let heartbeat = authority.heartbeat().await.unwrap();
        watcher.process_heartbeat(heartbeat);

        assert!(shared.ledger.has_event(0, EventKind::RewardEpochStarted));
        assert!(
            shared
                .ledger
                .has_event(0, EventKind::RandomAcquisitionStarted)
        );
        assert!(
            shared
                .ledger
                .has_event(0, EventKind::VotePowerBlockSelected)
        );
        assert_eq!(shared.ledger.latest_initialized_round(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn installs_observed_policies() {
        let shared = Arc::new(SharedState::new());
        let wall = WallClock::start_at(T0);
        let authority = Arc::new(EmulatedAuthority::new(
            epochs(),
            wall.clone(),
            genesis_policy(),
            EmulatedConfig::default(),
        ));
        let watcher = watcher(shared.clone(), authority);

        let policy = SigningPolicy {
            reward_epoch_id: 1,
            start_voting_round_id: 5,
            threshold: 2,
            seed: [1; 32].into(),
            voters: vec![],
        };

        watcher.process_heartbeat(Heartbeat {
            block_timestamp: T0 + 30,
            logs: vec![
                LedgerEvent::from(SigningPolicyInitialized {
                    policy: policy.clone(),
                })
                .to_log(),
            ],
        });

        assert_eq!(shared.policies.get(1), Some(policy));
        // Recorded against the epoch it was observed in, not the one it is for.
        assert!(
            shared
                .ledger
                .has_event(0, EventKind::SigningPolicyInitialized)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn round_id_is_derived_from_block_timestamp() {
        let shared = Arc::new(SharedState::new());
        let wall = WallClock::start_at(T0);
        let authority = Arc::new(EmulatedAuthority::new(
            epochs(),
            wall,
            genesis_policy(),
            EmulatedConfig::default(),
        ));
        let watcher = watcher(shared.clone(), authority);

        watcher.process_heartbeat(Heartbeat {
            block_timestamp: T0 + 45,
            logs: vec![
                LedgerEvent::from(VotingRoundInitialized { voting_round_id: 2 }).to_log(),
            ],
        });

        assert_eq!(shared.ledger.latest_initialized_round(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_log_is_skipped() {
        let shared = Arc::new(SharedState::new());
        let wall = WallClock::start_at(T0);
        let authority = Arc::new(EmulatedAuthority::new(
            epochs(),
            wall,
            genesis_policy(),
            EmulatedConfig::default(),
        ));
        let watcher = watcher(shared.clone(), authority);

        watcher.process_heartbeat(Heartbeat {
            block_timestamp: T0,
            logs: vec![TransitionLog {
                kind: EventKind::VotePowerBlockSelected,
                payload: vec![0xff],
            }],
        });

        assert!(
            !shared
                .ledger
                .has_event(0, EventKind::VotePowerBlockSelected)
        );
    }
}
