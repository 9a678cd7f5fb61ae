//! Outcome generator: one spin sampled from a slot's statistical profile
//!
//! ```text
//! u ~ U[0,1)  ──miss──> SpinOutcome::loss
//!     │ hit (u < hit_frequency)
//!     v
//! z = BoxMuller(u1, u2)
//! sample = exp(-0.5 + s·z),  s = 0.5 + volatility/20
//! multiplier = round2(clamp(sample · rtp/100 · 1/hit_frequency, 0.1, 5000))
//! win = stake · multiplier
//! ```

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SlotProfile;
use crate::rng::UniformSource;

/// Location of the payout log-normal
pub const LOG_LOCATION: f64 = -0.5;

/// Smallest multiplier a hit can pay
pub const MIN_MULTIPLIER: f64 = 0.1;

/// Largest multiplier a hit can pay
pub const MAX_MULTIPLIER: f64 = 5000.0;

/// One spin's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Wager for the spin (supplied by the caller)
    pub stake: f64,
    /// Payout, `stake * multiplier`
    pub win: f64,
    /// Payout as a multiple of stake, 2 decimals, exactly 0 on a miss
    pub multiplier: f64,
    /// When the outcome was generated
    pub timestamp: DateTime<Utc>,
}

impl SpinOutcome {
    /// A losing spin
    pub fn loss(stake: f64) -> Self {
        Self {
            stake,
            win: 0.0,
            multiplier: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// A winning spin at an already rounded multiplier
    fn hit(stake: f64, multiplier: f64) -> Self {
        Self {
            stake,
            win: stake * multiplier,
            multiplier,
            timestamp: Utc::now(),
        }
    }

    /// Did the spin pay anything?
    pub fn is_win(&self) -> bool {
        self.multiplier > 0.0
    }
}

/// Log-normal scale for a volatility setting
#[inline]
pub fn log_scale(volatility: f64) -> f64 {
    0.5 + volatility / 20.0
}

/// Standard normal variate via Box–Muller.
///
/// Consumes exactly two uniform draws. The first is mirrored to `(0, 1]`
/// so the logarithm stays finite.
pub fn standard_normal<S: UniformSource + ?Sized>(source: &mut S) -> f64 {
    let u1 = 1.0 - source.next_f64();
    let u2 = source.next_f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Generate one spin.
///
/// # Panics
/// If `stake <= 0` or `hit_frequency` lies outside `(0, 1]`. Both are
/// caller obligations, not runtime conditions.
pub fn generate<S: UniformSource + ?Sized>(
    stake: f64,
    profile: &SlotProfile,
    source: &mut S,
) -> SpinOutcome {
    assert!(stake > 0.0, "stake must be positive, got {stake}");
    assert!(
        profile.hit_frequency > 0.0 && profile.hit_frequency <= 1.0,
        "hit_frequency must lie in (0, 1], got {}",
        profile.hit_frequency
    );

    if source.next_f64() >= profile.hit_frequency {
        return SpinOutcome::loss(stake);
    }

    let z = standard_normal(source);
    let sample = (LOG_LOCATION + log_scale(profile.volatility) * z).exp();
    let raw = sample * (profile.target_rtp / 100.0) * (1.0 / profile.hit_frequency);

    SpinOutcome::hit(stake, round2(clamp_multiplier(raw)))
}

/// Apply the payout floor and cap
#[inline]
pub fn clamp_multiplier(raw: f64) -> f64 {
    raw.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Long-run RTP the generator actually tends to, ignoring floor and cap.
///
/// The payout scaling assumes the log-normal sample averages 1, but its mean
/// is `exp(u + s²/2)`. The two only agree at volatility 10 (`s = 1`).
pub fn analytic_rtp(profile: &SlotProfile) -> f64 {
    let s = log_scale(profile.volatility);
    profile.target_rtp * (LOG_LOCATION + s * s / 2.0).exp()
}
