//! Per-slot running statistics

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::batch::BatchSummary;
use crate::outcome::SpinOutcome;

/// Outcomes kept in `history`
pub const HISTORY_CAPACITY: usize = 100;

/// Live-RTP snapshots kept in `recent_rtp_history`
pub const RTP_WINDOW: usize = 30;

/// Copies of the target RTP a fresh record starts with
pub const RTP_SEED_LEN: usize = 20;

/// Direction of the latest live-RTP move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    /// No batch folded yet
    #[default]
    Neutral,
}

/// Running aggregate for one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStatistics {
    live_rtp: f64,
    total_spins: u64,
    total_hits: u64,
    cumulative_stakes: f64,
    cumulative_wins: f64,
    max_multiplier: f64,
    history: VecDeque<SpinOutcome>,
    recent_rtp_history: VecDeque<f64>,
    trend: Trend,
}

impl SlotStatistics {
    /// Fresh record: live RTP at target, RTP window pre-seeded flat
    pub fn fresh(target_rtp: f64) -> Self {
        let mut recent_rtp_history = VecDeque::with_capacity(RTP_WINDOW + 1);
        recent_rtp_history.extend(std::iter::repeat_n(target_rtp, RTP_SEED_LEN));

        Self {
            live_rtp: target_rtp,
            total_spins: 0,
            total_hits: 0,
            cumulative_stakes: 0.0,
            cumulative_wins: 0.0,
            max_multiplier: 0.0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            recent_rtp_history,
            trend: Trend::Neutral,
        }
    }

    /// Fold a batch into this record
    pub fn apply(&mut self, batch: &[SpinOutcome], target_rtp: f64) {
        let summary = BatchSummary::of(batch);
        let previous_rtp = self.live_rtp;

        self.cumulative_stakes += summary.total_stake;
        self.cumulative_wins += summary.total_win;
        self.total_spins += summary.spins;
        self.total_hits += summary.hits;
        self.live_rtp = if self.cumulative_stakes > 0.0 {
            (self.cumulative_wins / self.cumulative_stakes) * 100.0
        } else {
            target_rtp
        };
        if !batch.is_empty() {
            self.max_multiplier = self.max_multiplier.max(summary.max_multiplier);
        }

        self.history.extend(batch.iter().cloned());
        truncate_front(&mut self.history, HISTORY_CAPACITY);

        self.recent_rtp_history.push_back(self.live_rtp);
        truncate_front(&mut self.recent_rtp_history, RTP_WINDOW);

        self.trend = if self.live_rtp > previous_rtp {
            Trend::Up
        } else {
            Trend::Down
        };
    }

    /// Pure variant of [`apply`](Self::apply)
    pub fn applied(&self, batch: &[SpinOutcome], target_rtp: f64) -> Self {
        let mut next = self.clone();
        next.apply(batch, target_rtp);
        next
    }

    pub fn live_rtp(&self) -> f64 {
        self.live_rtp
    }

    pub fn total_spins(&self) -> u64 {
        self.total_spins
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn cumulative_stakes(&self) -> f64 {
        self.cumulative_stakes
    }

    pub fn cumulative_wins(&self) -> f64 {
        self.cumulative_wins
    }

    pub fn max_multiplier(&self) -> f64 {
        self.max_multiplier
    }

    /// Most recent outcomes, oldest first
    pub fn history(&self) -> &VecDeque<SpinOutcome> {
        &self.history
    }

    /// Most recent live-RTP snapshots, oldest first
    pub fn recent_rtp_history(&self) -> &VecDeque<f64> {
        &self.recent_rtp_history
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Observed hit rate in percent (0 before any spin)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.total_hits as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Wins minus stakes
    pub fn net_result(&self) -> f64 {
        self.cumulative_wins - self.cumulative_stakes
    }

    /// Last `n` live-RTP snapshots, oldest first
    pub fn rtp_tail(&self, n: usize) -> Vec<f64> {
        let skip = self.recent_rtp_history.len().saturating_sub(n);
        self.recent_rtp_history.iter().skip(skip).copied().collect()
    }
}

/// Pure fold: `stats` plus `batch`
pub fn apply_batch(
    stats: &SlotStatistics,
    batch: &[SpinOutcome],
    target_rtp: f64,
) -> SlotStatistics {
    stats.applied(batch, target_rtp)
}

fn truncate_front<T>(buf: &mut VecDeque<T>, capacity: usize) {
    let excess = buf.len().saturating_sub(capacity);
    buf.drain(..excess);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotProfile;
    use crate::batch::run_batch;
    use crate::rng::{ScriptedSource, SeededSource};

    const TARGET: f64 = 96.21;

    fn outcome(stake: f64, multiplier: f64) -> SpinOutcome {
        SpinOutcome {
            stake,
            win: stake * multiplier,
            multiplier,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_fresh_record() {
        let stats = SlotStatistics::fresh(TARGET);
        assert_eq!(stats.live_rtp(), TARGET);
        assert_eq!(stats.total_spins(), 0);
        assert!(stats.history().is_empty());
        assert_eq!(stats.recent_rtp_history().len(), RTP_SEED_LEN);
        assert!(stats.recent_rtp_history().iter().all(|&r| r == TARGET));
        assert_eq!(stats.trend(), Trend::Neutral);
    }

    #[test]
    fn test_reference_scenario() {
        let profile = SlotProfile::book_of_dead();
        let mut source = SeededSource::new(2024);
        let batch = run_batch(&profile, 100, 1.0, &mut source);
        assert_eq!(batch.len(), 100);

        let next = apply_batch(&SlotStatistics::fresh(TARGET), &batch, TARGET);
        assert_eq!(next.total_spins(), 100);
        assert_eq!(next.history().len(), 100);
        assert_eq!(next.recent_rtp_history().len(), 21);
        assert_eq!(next.cumulative_stakes(), 100.0);
    }

    #[test]
    fn test_live_rtp_formula() {
        let mut stats = SlotStatistics::fresh(TARGET);
        stats.apply(&[outcome(1.0, 0.0), outcome(1.0, 1.5)], TARGET);
        assert!((stats.live_rtp() - 75.0).abs() < 1e-12);
        assert_eq!(stats.max_multiplier(), 1.5);
        assert_eq!(stats.total_hits(), 1);
        assert_eq!(stats.hit_rate(), 50.0);
        assert_eq!(stats.net_result(), -0.5);
    }

    #[test]
    fn test_empty_batch_keeps_target_rtp() {
        let stats = apply_batch(&SlotStatistics::fresh(TARGET), &[], TARGET);
        assert_eq!(stats.live_rtp(), TARGET);
        assert_eq!(stats.total_spins(), 0);
        assert_eq!(stats.max_multiplier(), 0.0);
        assert_eq!(stats.recent_rtp_history().len(), RTP_SEED_LEN + 1);
        // equal RTP is not an up move
        assert_eq!(stats.trend(), Trend::Down);
    }

    #[test]
    fn test_trend() {
        let mut stats = SlotStatistics::fresh(TARGET);
        stats.apply(&[outcome(1.0, 0.0)], TARGET);
        assert_eq!(stats.trend(), Trend::Down);
        assert_eq!(stats.live_rtp(), 0.0);

        stats.apply(&[outcome(1.0, 10.0)], TARGET);
        assert_eq!(stats.trend(), Trend::Up);
        assert!((stats.live_rtp() - 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_windows_stay_bounded() {
        let profile = SlotProfile::razor_shark();
        let mut source = SeededSource::new(77);
        let mut stats = SlotStatistics::fresh(profile.target_rtp);

        for size in [1, 7, 100, 250, 3, 99] {
            let batch = run_batch(&profile, size, 1.0, &mut source);
            stats.apply(&batch, profile.target_rtp);
            assert!(stats.history().len() <= HISTORY_CAPACITY);
            assert!(stats.recent_rtp_history().len() <= RTP_WINDOW);
        }
        assert_eq!(stats.history().len(), HISTORY_CAPACITY);
        assert_eq!(stats.recent_rtp_history().len(), 26);
    }

    #[test]
    fn test_history_keeps_newest() {
        let mut stats = SlotStatistics::fresh(TARGET);
        let batch: Vec<_> = (0..150).map(|i| outcome(1.0, i as f64)).collect();
        stats.apply(&batch, TARGET);

        let first = stats.history().front().unwrap();
        let last = stats.history().back().unwrap();
        assert_eq!(first.multiplier, 50.0);
        assert_eq!(last.multiplier, 149.0);
    }

    #[test]
    fn test_rtp_tail() {
        let mut stats = SlotStatistics::fresh(TARGET);
        stats.apply(&[outcome(1.0, 0.0)], TARGET);
        let tail = stats.rtp_tail(5);
        assert_eq!(tail, vec![TARGET, TARGET, TARGET, TARGET, 0.0]);
        assert_eq!(stats.rtp_tail(100).len(), RTP_SEED_LEN + 1);
    }

    #[test]
    fn test_all_miss_batch_tracks_zero_max() {
        let profile = SlotProfile::book_of_dead();
        let mut source = ScriptedSource::new(vec![0.5]);
        let batch = run_batch(&profile, 20, 1.0, &mut source);
        let stats = apply_batch(&SlotStatistics::fresh(TARGET), &batch, TARGET);
        assert_eq!(stats.max_multiplier(), 0.0);
        assert_eq!(stats.live_rtp(), 0.0);
    }
}
