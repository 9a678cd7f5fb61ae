//! Live session: profiles, tracked subset, per-slot statistics and wallet
//!
//! A [`Session`] is the single writer of every statistics record. One call to
//! [`Session::tick`] generates a batch per tracked slot (in parallel), then
//! folds the batches and settles the wallet on the calling thread.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use st_sim::{
    BatchSummary, SeededSource, SlotProfile, SlotStatistics, SpinOutcome, Trend, run_batch,
    validate_stake,
};

use crate::config::SessionConfig;
use crate::error::{LiveError, LiveResult};
use crate::wallet::Wallet;

/// One slot's share of a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotTickSummary {
    pub id: String,
    pub batch: BatchSummary,
    pub live_rtp: f64,
    pub trend: Trend,
}

/// Result of one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Per tracked slot, in profile order
    pub slots: Vec<SlotTickSummary>,
    /// Sum over all slots
    pub totals: BatchSummary,
    /// Wallet balance after settlement
    pub balance: f64,
}

/// In-memory state of one tracking session
#[derive(Debug, Clone)]
pub struct Session {
    profiles: Vec<SlotProfile>,
    tracked: HashSet<String>,
    stats: HashMap<String, SlotStatistics>,
    stake: f64,
    batch_size: usize,
    wallet: Wallet,
}

impl Session {
    /// Build from a validated config
    pub fn new(config: &SessionConfig) -> LiveResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config.clone()))
    }

    /// Session over the built-in catalog with default settings
    pub fn with_catalog() -> Self {
        Self::from_config(SessionConfig::default())
    }

    fn from_config(config: SessionConfig) -> Self {
        let stats = config
            .profiles
            .iter()
            .map(|p| (p.id.clone(), SlotStatistics::fresh(p.target_rtp)))
            .collect();

        Self {
            profiles: config.profiles,
            tracked: config.tracked.into_iter().collect(),
            stats,
            stake: config.stake,
            batch_size: config.batch_size,
            wallet: Wallet::new(config.initial_balance),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // READ SIDE
    // ═══════════════════════════════════════════════════════════════════════

    pub fn profiles(&self) -> &[SlotProfile] {
        &self.profiles
    }

    pub fn profile(&self, id: &str) -> Option<&SlotProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn statistics(&self, id: &str) -> Option<&SlotStatistics> {
        self.stats.get(id)
    }

    /// All statistics records, in profile order
    pub fn all_statistics(&self) -> Vec<(&SlotProfile, &SlotStatistics)> {
        self.profiles
            .iter()
            .filter_map(|p| self.stats.get(&p.id).map(|s| (p, s)))
            .collect()
    }

    /// Tracked ids, in profile order
    pub fn tracked_ids(&self) -> Vec<&str> {
        self.profiles
            .iter()
            .filter(|p| self.tracked.contains(&p.id))
            .map(|p| p.id.as_str())
            .collect()
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked.contains(id)
    }

    pub fn stake(&self) -> f64 {
        self.stake
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    // ═══════════════════════════════════════════════════════════════════════
    // USER ACTIONS
    // ═══════════════════════════════════════════════════════════════════════

    fn require(&self, id: &str) -> LiveResult<()> {
        if self.profile(id).is_some() {
            Ok(())
        } else {
            Err(LiveError::UnknownSlot(id.to_string()))
        }
    }

    /// Start tracking; returns false if it already was
    pub fn track(&mut self, id: &str) -> LiveResult<bool> {
        self.require(id)?;
        Ok(self.tracked.insert(id.to_string()))
    }

    /// Stop tracking; returns false if it was not tracked
    pub fn untrack(&mut self, id: &str) -> LiveResult<bool> {
        self.require(id)?;
        Ok(self.tracked.remove(id))
    }

    /// Flip tracking; returns the new state
    pub fn toggle_tracking(&mut self, id: &str) -> LiveResult<bool> {
        if self.is_tracked(id) {
            self.untrack(id)?;
            Ok(false)
        } else {
            self.track(id)?;
            Ok(true)
        }
    }

    /// Change a slot's volatility, effective from the next tick
    pub fn set_volatility(&mut self, id: &str, volatility: f64) -> LiveResult<()> {
        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LiveError::UnknownSlot(id.to_string()))?;
        profile.set_volatility(volatility)?;
        log::debug!("Volatility of {} set to {}", id, volatility);
        Ok(())
    }

    /// Change the global stake (must be a denomination)
    pub fn set_stake(&mut self, stake: f64) -> LiveResult<()> {
        self.stake = validate_stake(stake)?;
        Ok(())
    }

    /// Register a new slot with fresh statistics (untracked)
    pub fn add_profile(&mut self, profile: SlotProfile) -> LiveResult<()> {
        profile.validate()?;
        if self.profile(&profile.id).is_some() {
            return Err(st_sim::SimError::DuplicateProfile(profile.id).into());
        }
        self.stats
            .insert(profile.id.clone(), SlotStatistics::fresh(profile.target_rtp));
        log::info!("Added slot profile {}", profile.id);
        self.profiles.push(profile);
        Ok(())
    }

    /// Drop a slot, its tracking and its statistics
    pub fn remove_profile(&mut self, id: &str) -> LiveResult<SlotProfile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LiveError::UnknownSlot(id.to_string()))?;
        self.tracked.remove(id);
        self.stats.remove(id);
        Ok(self.profiles.remove(index))
    }

    /// Fresh statistics for every slot; wallet untouched
    pub fn reset_statistics(&mut self) {
        for profile in &self.profiles {
            self.stats
                .insert(profile.id.clone(), SlotStatistics::fresh(profile.target_rtp));
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════

    /// Run one batch per tracked slot and fold everything in.
    ///
    /// Each slot draws from its own stream forked off `master` in profile
    /// order, so a seeded master gives the same tick regardless of how rayon
    /// schedules the batches.
    pub fn tick(&mut self, master: &mut SeededSource) -> TickReport {
        let stake = self.stake;
        let iterations = self.batch_size;

        let jobs: Vec<(&SlotProfile, SeededSource)> = self
            .profiles
            .iter()
            .filter(|p| self.tracked.contains(&p.id))
            .map(|p| (p, master.fork()))
            .collect();

        let batches: Vec<(String, f64, Vec<SpinOutcome>)> = jobs
            .into_par_iter()
            .map(|(profile, mut source)| {
                let batch = run_batch(profile, iterations, stake, &mut source);
                (profile.id.clone(), profile.target_rtp, batch)
            })
            .collect();

        let mut report = TickReport::default();
        for (id, target_rtp, batch) in batches {
            let summary = BatchSummary::of(&batch);
            let stats = self
                .stats
                .entry(id.clone())
                .or_insert_with(|| SlotStatistics::fresh(target_rtp));
            stats.apply(&batch, target_rtp);

            report.totals.merge(&summary);
            report.slots.push(SlotTickSummary {
                id,
                batch: summary,
                live_rtp: stats.live_rtp(),
                trend: stats.trend(),
            });
        }

        self.wallet.settle(&report.totals);
        report.balance = self.wallet.balance();
        report
    }
}
