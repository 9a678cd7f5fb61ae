//! Advisory seam
//!
//! The generative-AI collaborator lives outside this workspace. This module
//! hands it aggregated digests, parses what comes back, and decides what to
//! show when it fails or throttles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use st_sim::{SlotProfile, SlotStatistics};

/// RTP tail length handed to the advisor
pub const DIGEST_TAIL: usize = 5;

/// Advisor failures
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Advisor rate limited")]
    RateLimited,

    #[error("Advisor unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed advisor response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Luck call for a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LuckForecast {
    Hot,
    Cold,
    #[default]
    Stable,
}

/// What the advisor sees about one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDigest {
    pub slot_id: String,
    pub name: String,
    pub target_rtp: f64,
    pub live_rtp: f64,
    pub max_multiplier: f64,
    pub total_spins: u64,
    pub volatility: f64,
    /// Last few live-RTP snapshots, oldest first
    pub rtp_trend: Vec<f64>,
}

impl SlotDigest {
    pub fn new(profile: &SlotProfile, stats: &SlotStatistics) -> Self {
        Self {
            slot_id: profile.id.clone(),
            name: profile.name.clone(),
            target_rtp: profile.target_rtp,
            live_rtp: stats.live_rtp(),
            max_multiplier: stats.max_multiplier(),
            total_spins: stats.total_spins(),
            volatility: profile.volatility,
            rtp_trend: stats.rtp_tail(DIGEST_TAIL),
        }
    }

    /// Live minus target, percentage points
    pub fn deviation(&self) -> f64 {
        self.live_rtp - self.target_rtp
    }
}

/// What the advisor sees about the whole session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDigest {
    pub balance: f64,
    pub total_wagered: f64,
    pub total_payouts: f64,
    pub total_spins: u64,
    pub net_position: f64,
}

impl PortfolioDigest {
    /// Sum over every statistics record
    pub fn new<'a>(stats: impl IntoIterator<Item = &'a SlotStatistics>, balance: f64) -> Self {
        let mut digest = stats.into_iter().fold(
            Self {
                balance,
                ..Default::default()
            },
            |mut acc, s| {
                acc.total_wagered += s.cumulative_stakes();
                acc.total_payouts += s.cumulative_wins();
                acc.total_spins += s.total_spins();
                acc
            },
        );
        digest.net_position = digest.total_payouts - digest.total_wagered;
        digest
    }
}

/// Commentary plus luck call for one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotInsight {
    pub commentary: String,
    pub luck_forecast: LuckForecast,
    pub analysis_time: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInsight {
    commentary: Option<String>,
    luck_forecast: Option<LuckForecast>,
}

impl SlotInsight {
    pub fn new(commentary: impl Into<String>, luck_forecast: LuckForecast) -> Self {
        Self {
            commentary: commentary.into(),
            luck_forecast,
            analysis_time: Utc::now(),
        }
    }

    /// Parse the advisor's JSON text; missing fields fall back to "Stable"
    pub fn from_json(text: &str) -> Result<Self, AdvisoryError> {
        let text = text.trim();
        let raw: RawInsight = serde_json::from_str(if text.is_empty() { "{}" } else { text })?;
        Ok(Self::new(
            raw.commentary
                .unwrap_or_else(|| "Stable performance detected.".into()),
            raw.luck_forecast.unwrap_or_default(),
        ))
    }

    /// Shown when the advisor call fails
    pub fn fallback() -> Self {
        Self::new(
            "Unable to process neural luck forecast at this time.",
            LuckForecast::Stable,
        )
    }
}

/// Session-level behavioral projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralForecast {
    /// 0-100
    pub churn_risk: f64,
    #[serde(rename = "projectedLTV")]
    pub projected_ltv: f64,
    pub deposit_probability: f64,
    /// 0-100
    pub profitability_confidence: f64,
    pub next_deposit_suggestion: String,
    pub suggestion_explanation: String,
}

impl BehavioralForecast {
    /// Parse the advisor's JSON text (all fields required)
    pub fn from_json(text: &str) -> Result<Self, AdvisoryError> {
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Before the first refresh
    pub fn initial() -> Self {
        Self {
            churn_risk: 5.0,
            projected_ltv: 10_000.0,
            deposit_probability: 2.0,
            profitability_confidence: 95.0,
            next_deposit_suggestion: "Neural analysis initializing...".into(),
            suggestion_explanation: "Calibrating baseline telemetry...".into(),
        }
    }

    /// When the advisor fails for any reason other than throttling
    pub fn fallback() -> Self {
        Self {
            churn_risk: 15.0,
            projected_ltv: 5_000.0,
            deposit_probability: 10.0,
            profitability_confidence: 85.0,
            next_deposit_suggestion: "Maintain current wager velocity.".into(),
            suggestion_explanation: "API Connectivity issues. Using fallback heuristics.".into(),
        }
    }
}

/// The external advisory collaborator
pub trait Advisor: Send + Sync {
    fn slot_insight(&self, digest: &SlotDigest) -> Result<SlotInsight, AdvisoryError>;

    fn behavioral_forecast(
        &self,
        digest: &PortfolioDigest,
    ) -> Result<BehavioralForecast, AdvisoryError>;
}

/// What a forecast refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastRefresh {
    Updated,
    /// Throttled; previous forecast kept, next cycle skipped
    RateLimited,
    /// Failed; fallback heuristics installed
    Fallback,
    /// Skipped to let a throttled quota recover
    Skipped,
}

/// Latest advisory results plus throttling state
#[derive(Debug, Clone)]
pub struct AdvisoryDesk {
    insights: HashMap<String, SlotInsight>,
    forecast: BehavioralForecast,
    rate_limited: bool,
}

impl AdvisoryDesk {
    pub fn new() -> Self {
        Self {
            insights: HashMap::new(),
            forecast: BehavioralForecast::initial(),
            rate_limited: false,
        }
    }

    /// Ask for a fresh slot insight; failures install the fallback
    pub fn refresh_insight(&mut self, advisor: &dyn Advisor, digest: &SlotDigest) -> &SlotInsight {
        let insight = advisor.slot_insight(digest).unwrap_or_else(|e| {
            log::error!("Slot insight for {} failed: {}", digest.slot_id, e);
            SlotInsight::fallback()
        });
        self.insights.insert(digest.slot_id.clone(), insight);
        &self.insights[&digest.slot_id]
    }

    /// Ask for a fresh behavioral forecast.
    ///
    /// After a throttled call the next refresh is skipped once, which also
    /// clears the throttle flag.
    pub fn refresh_forecast(
        &mut self,
        advisor: &dyn Advisor,
        digest: &PortfolioDigest,
    ) -> ForecastRefresh {
        if self.rate_limited {
            log::info!("Skipping forecast refresh due to active rate limit");
            self.rate_limited = false;
            return ForecastRefresh::Skipped;
        }

        match advisor.behavioral_forecast(digest) {
            Ok(forecast) => {
                self.forecast = forecast;
                ForecastRefresh::Updated
            }
            Err(AdvisoryError::RateLimited) => {
                log::warn!("Forecast advisor rate limited");
                self.rate_limited = true;
                ForecastRefresh::RateLimited
            }
            Err(e) => {
                log::warn!("Forecast advisor failed: {}", e);
                self.forecast = BehavioralForecast::fallback();
                ForecastRefresh::Fallback
            }
        }
    }

    pub fn insight(&self, slot_id: &str) -> Option<&SlotInsight> {
        self.insights.get(slot_id)
    }

    pub fn forecast(&self) -> &BehavioralForecast {
        &self.forecast
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }
}

impl Default for AdvisoryDesk {
    fn default() -> Self {
        Self::new()
    }
}

/// Offline advisor: calls luck from the live/target RTP gap.
///
/// Has no behavioral model, so forecasts always come back unavailable and
/// the desk shows its fallback heuristics.
#[derive(Debug, Clone)]
pub struct DeviationAdvisor {
    /// Percentage points either side of target still called "Stable"
    pub band: f64,
}

impl Default for DeviationAdvisor {
    fn default() -> Self {
        Self { band: 2.0 }
    }
}

impl Advisor for DeviationAdvisor {
    fn slot_insight(&self, digest: &SlotDigest) -> Result<SlotInsight, AdvisoryError> {
        let deviation = digest.deviation();
        let (forecast, commentary) = if deviation > self.band {
            (
                LuckForecast::Hot,
                format!(
                    "{} is running {:.2} points above its {:.2}% target.",
                    digest.name, deviation, digest.target_rtp
                ),
            )
        } else if deviation < -self.band {
            (
                LuckForecast::Cold,
                format!(
                    "{} is running {:.2} points below its {:.2}% target.",
                    digest.name, -deviation, digest.target_rtp
                ),
            )
        } else {
            (
                LuckForecast::Stable,
                format!("{} is tracking its {:.2}% target.", digest.name, digest.target_rtp),
            )
        };
        Ok(SlotInsight::new(commentary, forecast))
    }

    fn behavioral_forecast(
        &self,
        _digest: &PortfolioDigest,
    ) -> Result<BehavioralForecast, AdvisoryError> {
        Err(AdvisoryError::Unavailable("no offline behavioral model".into()))
    }
}
