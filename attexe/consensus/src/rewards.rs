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

//! Epoch-aligned reward offering, a side action with no consensus impact.
//!
//! Fires once per reward epoch, slightly after the epoch start, and posts the
//! configured offers for the next reward epoch. All failures are logged and
//! retried naturally by the next scheduled invocation.

use crate::{EpochTask, ProtocolContext, wait_until};
use anyhow::Result;
use async_trait::async_trait;
use attexe_common::{RewardEpochId, Timestamp, events::EventKind, policy::RewardOffer};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RewardOfferingConfig {
    /// Delay past the reward epoch start, leaving the epoch observably
    /// started in the event ledger.
    pub offer_delay: Duration,
    /// Post offers without waiting for the epoch-started ledger event.
    pub force: bool,
    pub offers: Vec<RewardOffer>,
}

impl Default for RewardOfferingConfig {
    fn default() -> Self {
        Self {
            offer_delay: Duration::from_secs(15),
            force: false,
            offers: Vec::new(),
        }
    }
}

pub struct RewardOfferingScheduler {
    ctx: ProtocolContext,
    config: RewardOfferingConfig,
}

impl RewardOfferingScheduler {
    pub fn new(ctx: ProtocolContext, config: RewardOfferingConfig) -> Self {
        Self { ctx, config }
    }

    pub async fn offer_for_epoch(&self, epoch: RewardEpochId) {
        let ctx = &self.ctx;

        if !self.config.force {
            let started = wait_until(&ctx.wall, &ctx.wait, "reward epoch start event", || {
                ctx.shared
                    .ledger
                    .has_event(epoch, EventKind::RewardEpochStarted)
            })
            .await;

            if let Err(err) = started {
                tracing::warn!(epoch, "skipping reward offers: {err}");
                return;
            }
        }

        if self.config.offers.is_empty() {
            tracing::debug!(epoch, "no reward offers configured");
            return;
        }

        let next_epoch = epoch + 1;
        match ctx
            .authority
            .offer_rewards(next_epoch, self.config.offers.clone())
            .await
        {
            Ok(()) => tracing::info!(
                next_epoch,
                offers = self.config.offers.len(),
                "🎁 reward offers posted",
            ),
            Err(err) => tracing::warn!(next_epoch, "reward offering failed: {err:#}"),
        }
    }
}

#[async_trait]
impl EpochTask for RewardOfferingScheduler {
    fn name(&self) -> &'static str {
        "reward-offering"
    }

    async fn run(&mut self, now: Timestamp) -> Result<Option<Timestamp>> {
        let epoch = self.ctx.epochs.reward_epoch_at(now);
        self.offer_for_epoch(epoch).await;

        Ok(Some(
            self.ctx.epochs.next_reward_epoch_start(now) + self.config.offer_delay.as_secs(),
        ))
    }
}
