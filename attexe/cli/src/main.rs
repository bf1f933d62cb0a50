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

mod args;
mod config;

use crate::{args::Args, config::Config};
use anyhow::{Context as _, Result};
use attexe_authority::{EmulatedAuthority, EmulatedConfig};
use attexe_common::{epochs::EpochConfig, policy::RewardOffer, time::WallClock};
use attexe_consensus::{RewardOfferingConfig, RoundDriverConfig, WaitConfig};
use attexe_observer::LedgerWatcherConfig;
use attexe_service::{Service, ServiceConfig, genesis_policy};
use attexe_signer::{Participant, Signer};
use clap::Parser;
use std::{env, fs, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let optional_config_path = env::current_dir()?.join(".attexe.toml");
    let args = if fs::metadata(&optional_config_path).is_ok() {
        // Logging is not initialized yet, as it may depend on args.
        println!(
            "❗️ Using configuration path: {}",
            optional_config_path.display()
        );
        let str = fs::read_to_string(optional_config_path)?;
        toml::from_str(&str)?
    } else {
        Args::parse()
    };

    let config = Config::try_from(args).context("failed to create configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    print_info(&config);

    let wall = WallClock::system();

    let epoch = EpochConfig {
        first_round_start: wall.now(),
        round_duration_secs: config.round_duration.as_secs(),
        first_reward_epoch_start_round: 0,
        rounds_per_reward_epoch: config.rounds_per_epoch,
    };
    let epochs = attexe_common::epochs::EpochClock::new(epoch)?;

    let signer = Signer::new();
    let participants: Vec<_> = (0..config.participants)
        .map(|_| Participant::generate(&signer))
        .collect();

    let genesis = genesis_policy(&participants);
    let authority = Arc::new(EmulatedAuthority::new(
        epochs,
        wall.clone(),
        genesis.clone(),
        EmulatedConfig::default(),
    ));

    let offers = (config.offer_amount > 0)
        .then(|| {
            participants
                .iter()
                .map(|participant| RewardOffer {
                    amount: config.offer_amount,
                    claim_back: participant.identity_address(),
                })
                .collect()
        })
        .unwrap_or_default();

    let service = Service::new(
        ServiceConfig {
            epoch,
            genesis_policy: genesis,
            watcher: LedgerWatcherConfig {
                poll_interval: config.poll_interval,
            },
            wait: WaitConfig {
                deadline: config.wait_deadline,
                ..Default::default()
            },
            policy: Default::default(),
            round: RoundDriverConfig {
                skip_submit: config.skip_submit,
                skip_finalize: config.skip_finalize,
                reveal_offset: config.round_duration / 4,
                ..Default::default()
            },
            rewards: RewardOfferingConfig {
                force: config.force_offers,
                offers,
                ..Default::default()
            },
        },
        authority,
        signer,
        participants,
        wall,
    )?;

    tokio::select! {
        res = service.run() => res?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down");
        }
    }

    Ok(())
}

fn print_info(config: &Config) {
    tracing::info!("🗳 Participants: {}", config.participants);
    tracing::info!(
        "⏱ Voting round: {}s, {} rounds per reward epoch",
        config.round_duration.as_secs(),
        config.rounds_per_epoch
    );
    tracing::info!(
        "🧾 Submissions: {}, finalization: {}",
        if config.skip_submit { "off" } else { "on" },
        if config.skip_finalize { "off" } else { "on" },
    );
}
