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

//! Shared protocol state: the observed event ledger and the signing policy map.
//!
//! Both are written exclusively by the ledger watcher and read by the protocol
//! drivers. Readers are polling snapshots, so nothing beyond per-key
//! linearizability is provided.

use crate::{RewardEpochId, VotingRoundId, events::EventKind, policy::SigningPolicy};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Append-only record of phase-transition events observed from the authority.
///
/// Event names may legitimately repeat and are not deduplicated; entries are
/// never removed.
#[derive(Debug, Default)]
pub struct EventLedger {
    inner: RwLock<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    events: BTreeMap<RewardEpochId, Vec<EventKind>>,
    latest_initialized_round: Option<VotingRoundId>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, epoch: RewardEpochId, kind: EventKind) {
        self.inner.write().events.entry(epoch).or_default().push(kind);
    }

    pub fn has_event(&self, epoch: RewardEpochId, kind: EventKind) -> bool {
        self.inner
            .read()
            .events
            .get(&epoch)
            .is_some_and(|events| events.contains(&kind))
    }

    /// Events observed for the epoch, in append order.
    pub fn events(&self, epoch: RewardEpochId) -> Vec<EventKind> {
        self.inner
            .read()
            .events
            .get(&epoch)
            .cloned()
            .unwrap_or_default()
    }

    /// Raises the latest initialized round marker; never lowers it.
    pub fn mark_round_initialized(&self, round: VotingRoundId) {
        let mut inner = self.inner.write();
        let latest = inner.latest_initialized_round.get_or_insert(round);
        *latest = (*latest).max(round);
    }

    pub fn latest_initialized_round(&self) -> Option<VotingRoundId> {
        self.inner.read().latest_initialized_round
    }
}

/// Signing policies installed by the ledger watcher, keyed by reward epoch.
///
/// Policies for old epochs are never evicted; epoch counts in a single run
/// are small enough for the growth to stay bounded in practice.
#[derive(Debug, Default)]
pub struct PolicyStore {
    policies: RwLock<BTreeMap<RewardEpochId, SigningPolicy>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, policy: SigningPolicy) {
        self.policies
            .write()
            .insert(policy.reward_epoch_id, policy);
    }

    pub fn get(&self, epoch: RewardEpochId) -> Option<SigningPolicy> {
        self.policies.read().get(&epoch).cloned()
    }

    pub fn contains(&self, epoch: RewardEpochId) -> bool {
        self.policies.read().contains_key(&epoch)
    }
}

/// The mutable state shared between the ledger watcher and the drivers.
#[derive(Debug, Default)]
pub struct SharedState {
    pub ledger: EventLedger,
    pub policies: PolicyStore,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }
}
