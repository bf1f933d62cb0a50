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

//! Deadline scheduler for the self-rearming protocol drivers.
//!
//! One controller loop owns a priority queue of `(fire time, task)` pairs.
//! A task that returns a next fire time is re-armed; a task that errors is
//! halted and its siblings keep running.

use anyhow::Result;
use async_trait::async_trait;
use attexe_common::{Timestamp, time::WallClock};
use std::{cmp::Reverse, collections::BinaryHeap};

/// A deadline-fired protocol task.
#[async_trait]
pub trait EpochTask: Send {
    fn name(&self) -> &'static str;

    /// Execute one firing. Returns the next fire time, or `None` to retire.
    async fn run(&mut self, now: Timestamp) -> Result<Option<Timestamp>>;
}

pub struct Scheduler {
    wall: WallClock,
    tasks: Vec<Option<Box<dyn EpochTask>>>,
    queue: BinaryHeap<Reverse<(Timestamp, usize)>>,
}

impl Scheduler {
    pub fn new(wall: WallClock) -> Self {
        Self {
            wall,
            tasks: Vec::new(),
            queue: BinaryHeap::new(),
        }
    }

    pub fn schedule(&mut self, fire_at: Timestamp, task: Box<dyn EpochTask>) {
        let index = self.tasks.len();
        self.tasks.push(Some(task));
        self.queue.push(Reverse((fire_at, index)));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drive tasks until none remain armed.
    pub async fn run(mut self) -> Result<()> {
        while let Some(Reverse((fire_at, index))) = self.queue.pop() {
            self.wall.sleep_until(fire_at).await;

            let Some(mut task) = self.tasks[index].take() else {
                continue;
            };

            let now = self.wall.now();
            tracing::debug!(task = task.name(), now, "task fired");

            match task.run(now).await {
                Ok(Some(next)) => {
                    tracing::debug!(task = task.name(), next, "task re-armed");
                    self.tasks[index] = Some(task);
                    self.queue.push(Reverse((next, index)));
                }
                Ok(None) => {
                    tracing::info!(task = task.name(), "task retired");
                }
                Err(err) => {
                    tracing::error!(
                        task = task.name(),
                        "💀 task halted on unrecoverable error: {err:#}"
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    struct Recording {
        name: &'static str,
        fires: Arc<Mutex<Vec<(&'static str, Timestamp)>>>,
        rearms: Vec<Timestamp>,
        fail_on_fire: Option<usize>,
        fired: usize,
    }

    #[async_trait]
    impl EpochTask for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&mut self, now: Timestamp) -> Result<Option<Timestamp>> {
            self.fires.lock().unwrap().push((self.name, now));
            self.fired += 1;

            if self.fail_on_fire == Some(self.fired) {
                bail!("scripted failure");
            }

            Ok(if self.rearms.is_empty() {
                None
            } else {
                Some(self.rearms.remove(0))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_deadline_order_and_rearms() {
        let wall = WallClock::start_at(1_000);
        let fires = Arc::new(Mutex::new(Vec::new()));

        let mut scheduler = Scheduler::new(wall);
        scheduler.schedule(
            1_020,
            Box::new(Recording {
                name: "b",
                fires: fires.clone(),
                rearms: vec![],
                fail_on_fire: None,
                fired: 0,
            }),
        );
        scheduler.schedule(
            1_010,
            Box::new(Recording {
                name: "a",
                fires: fires.clone(),
                rearms: vec![1_030],
                fail_on_fire: None,
                fired: 0,
            }),
        );

        scheduler.run().await.unwrap();

        assert_eq!(
            *fires.lock().unwrap(),
            vec![("a", 1_010), ("b", 1_020), ("a", 1_030)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_task_is_halted_but_siblings_continue() {
        let wall = WallClock::start_at(1_000);
        let fires = Arc::new(Mutex::new(Vec::new()));

        let mut scheduler = Scheduler::new(wall);
        scheduler.schedule(
            1_005,
            Box::new(Recording {
                name: "dies",
                fires: fires.clone(),
                rearms: vec![1_015, 1_025],
                fail_on_fire: Some(1),
                fired: 0,
            }),
        );
        scheduler.schedule(
            1_010,
            Box::new(Recording {
                name: "lives",
                fires: fires.clone(),
                rearms: vec![1_020],
                fail_on_fire: None,
                fired: 0,
            }),
        );

        scheduler.run().await.unwrap();

        assert_eq!(
            *fires.lock().unwrap(),
            vec![("dies", 1_005), ("lives", 1_010), ("lives", 1_020)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadlines_fire_immediately() {
        let wall = WallClock::start_at(1_000);
        let fires = Arc::new(Mutex::new(Vec::new()));

        let mut scheduler = Scheduler::new(wall);
        scheduler.schedule(
            900,
            Box::new(Recording {
                name: "late",
                fires: fires.clone(),
                rearms: vec![],
                fail_on_fire: None,
                fired: 0,
            }),
        );

        scheduler.run().await.unwrap();

        assert_eq!(*fires.lock().unwrap(), vec![("late", 1_000)]);
    }
}
