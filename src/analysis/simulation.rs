//! Cosmetic progress simulation.
//!
//! The server does not report progress, so while the request is in flight the checks are
//! advanced on a timer. The simulation never ends a run by itself; it is aborted as soon as the
//! request settles.

use super::store::{AnalysisStore, RunId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{ops::RangeInclusive, time::Duration};
use tokio::time;

/// Interval range of the random schedule, in milliseconds.
const RANDOM_INTERVAL_MS: RangeInclusive<u64> = 600..=1_200;
/// Increment range of the random schedule, in progress points.
const RANDOM_INCREMENT: RangeInclusive<u8> = 3..=15;

/// How the cosmetic progress advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simulator {
    /// Random intervals and increments, as shown to users.
    Random,
    /// Fixed interval and increment. Deterministic, used by tests.
    Fixed {
        /// Time between two ticks.
        interval: Duration,
        /// Progress points added at each tick.
        increment: u8,
    },
    /// No simulation at all: progress jumps from 0 to 100 when the request succeeds.
    Disabled,
}

impl Simulator {
    /// Creates the tick schedule of one run.
    pub fn schedule(self) -> Schedule {
        Schedule {
            simulator: self,
            rng: match self {
                Simulator::Random => Some(StdRng::from_entropy()),
                _ => None,
            },
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::Random
    }
}

/// One simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Time to wait before applying the tick.
    pub delay: Duration,
    /// Progress points to add.
    pub increment: u8,
}

/// Endless sequence of ticks for one run.
#[derive(Debug)]
pub struct Schedule {
    simulator: Simulator,
    rng: Option<StdRng>,
}

impl Iterator for Schedule {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        match self.simulator {
            Simulator::Random => {
                let rng = self.rng.get_or_insert_with(StdRng::from_entropy);
                Some(Tick {
                    delay: Duration::from_millis(rng.gen_range(RANDOM_INTERVAL_MS)),
                    increment: rng.gen_range(RANDOM_INCREMENT),
                })
            }
            Simulator::Fixed {
                interval,
                increment,
            } => Some(Tick {
                delay: interval,
                increment,
            }),
            Simulator::Disabled => None,
        }
    }
}

/// Runs the simulation of `run` until the schedule ends or the store rejects a tick.
pub async fn simulate(store: AnalysisStore, run: RunId, schedule: Schedule) {
    for tick in schedule {
        time::sleep(tick.delay).await;
        if !store.advance(run, tick.increment) {
            break;
        }
    }
}
