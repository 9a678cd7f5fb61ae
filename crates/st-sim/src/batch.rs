//! Batch generation and batch reduction

use serde::{Deserialize, Serialize};

use crate::config::SlotProfile;
use crate::outcome::{SpinOutcome, generate};
use crate::rng::UniformSource;

/// Spins per slot per tick
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Generate `iterations` independent outcomes, in generation order.
///
/// # Panics
/// If `iterations` is zero, or on the generator's own preconditions.
pub fn run_batch<S: UniformSource + ?Sized>(
    profile: &SlotProfile,
    iterations: usize,
    stake: f64,
    source: &mut S,
) -> Vec<SpinOutcome> {
    assert!(iterations >= 1, "a batch needs at least one iteration");

    let mut outcomes = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        outcomes.push(generate(stake, profile, source));
    }
    outcomes
}

/// Totals of a batch (or of several batches merged)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub spins: u64,
    pub hits: u64,
    pub total_stake: f64,
    pub total_win: f64,
    pub max_multiplier: f64,
}

impl BatchSummary {
    /// Reduce a batch
    pub fn of(batch: &[SpinOutcome]) -> Self {
        batch.iter().fold(Self::default(), |mut acc, outcome| {
            acc.spins += 1;
            if outcome.is_win() {
                acc.hits += 1;
            }
            acc.total_stake += outcome.stake;
            acc.total_win += outcome.win;
            acc.max_multiplier = acc.max_multiplier.max(outcome.multiplier);
            acc
        })
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: &BatchSummary) {
        self.spins += other.spins;
        self.hits += other.hits;
        self.total_stake += other.total_stake;
        self.total_win += other.total_win;
        self.max_multiplier = self.max_multiplier.max(other.max_multiplier);
    }

    /// Wins minus stakes
    pub fn net(&self) -> f64 {
        self.total_win - self.total_stake
    }

    /// Batch RTP in percent, `None` when nothing was staked
    pub fn rtp(&self) -> Option<f64> {
        (self.total_stake > 0.0).then(|| self.total_win / self.total_stake * 100.0)
    }
}
