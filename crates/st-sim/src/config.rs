//! Slot profiles, the built-in catalog and stake denominations

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Lowest volatility a user can dial in
pub const MIN_VOLATILITY: f64 = 1.0;

/// Highest volatility a user can dial in
pub const MAX_VOLATILITY: f64 = 20.0;

/// Monetary denominations available for the global stake
pub const STAKE_OPTIONS: [f64; 9] = [0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0, 100.0];

/// Stake selected when nothing else is configured
pub const DEFAULT_STAKE: f64 = 1.0;

/// Statistical profile of one slot game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotProfile {
    /// Stable key, unique across profiles
    pub id: String,
    /// Display name
    pub name: String,
    /// Theoretical long-run return, percent in (0, 100]
    pub target_rtp: f64,
    /// Probability that a spin pays anything, in (0, 1]
    pub hit_frequency: f64,
    /// Payout spread, user-adjustable in [1, 20]
    pub volatility: f64,
    /// Display color (cosmetic)
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#94a3b8".into()
}

impl SlotProfile {
    /// Create a profile with the default color
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_rtp: f64,
        hit_frequency: f64,
        volatility: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_rtp,
            hit_frequency,
            volatility,
            color: default_color(),
        }
    }

    /// Builder: set display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Book of Dead
    pub fn book_of_dead() -> Self {
        Self::new("book-of-dead", "Book of Dead", 96.21, 0.29, 5.0).with_color("#fbbf24")
    }

    /// Razor Shark
    pub fn razor_shark() -> Self {
        Self::new("razor-shark", "Razor Shark", 96.70, 0.18, 12.0).with_color("#06b6d4")
    }

    /// Sweet Bonanza
    pub fn sweet_bonanza() -> Self {
        Self::new("sweet-bonanza", "Sweet Bonanza", 96.48, 0.35, 3.5).with_color("#ec4899")
    }

    /// Gates of Olympus
    pub fn gates_of_olympus() -> Self {
        Self::new("gates-of-olympus", "Gates of Olympus", 96.50, 0.22, 9.0)
            .with_color("#8b5cf6")
    }

    /// Check every field against its domain
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |reason: String| SimError::InvalidProfile {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if !(self.target_rtp > 0.0 && self.target_rtp <= 100.0) {
            return Err(invalid(format!(
                "target_rtp {} outside (0, 100]",
                self.target_rtp
            )));
        }
        if !(self.hit_frequency > 0.0 && self.hit_frequency <= 1.0) {
            return Err(invalid(format!(
                "hit_frequency {} outside (0, 1]",
                self.hit_frequency
            )));
        }
        check_volatility(self.volatility)
    }

    /// Change volatility (the only field adjustable while simulating)
    pub fn set_volatility(&mut self, volatility: f64) -> SimResult<()> {
        check_volatility(volatility)?;
        self.volatility = volatility;
        Ok(())
    }
}

fn check_volatility(volatility: f64) -> SimResult<()> {
    if (MIN_VOLATILITY..=MAX_VOLATILITY).contains(&volatility) {
        Ok(())
    } else {
        Err(SimError::VolatilityOutOfRange(volatility))
    }
}

/// Built-in profiles, in display order
pub fn catalog() -> Vec<SlotProfile> {
    vec![
        SlotProfile::book_of_dead(),
        SlotProfile::razor_shark(),
        SlotProfile::sweet_bonanza(),
        SlotProfile::gates_of_olympus(),
    ]
}

/// Ids tracked when a session starts without explicit selection
pub fn default_tracked() -> Vec<String> {
    vec!["book-of-dead".into(), "razor-shark".into()]
}

/// Is `stake` one of the selectable denominations?
pub fn is_stake_option(stake: f64) -> bool {
    STAKE_OPTIONS.iter().any(|&s| (s - stake).abs() < 1e-9)
}

/// Validate a stake selection
pub fn validate_stake(stake: f64) -> SimResult<f64> {
    if is_stake_option(stake) {
        Ok(stake)
    } else {
        Err(SimError::InvalidStake(stake))
    }
}

/// Validate a whole profile set: every profile valid, ids unique
pub fn validate_profiles(profiles: &[SlotProfile]) -> SimResult<()> {
    let mut seen = HashSet::with_capacity(profiles.len());
    for profile in profiles {
        profile.validate()?;
        if !seen.insert(profile.id.as_str()) {
            return Err(SimError::DuplicateProfile(profile.id.clone()));
        }
    }
    Ok(())
}

/// Parse and validate a profile list from JSON
pub fn profiles_from_json(json: &str) -> SimResult<Vec<SlotProfile>> {
    let profiles: Vec<SlotProfile> = serde_json::from_str(json)?;
    validate_profiles(&profiles)?;
    log::debug!("Loaded {} slot profiles from JSON", profiles.len());
    Ok(profiles)
}

/// Parse and validate a profile list from YAML
pub fn profiles_from_yaml(yaml: &str) -> SimResult<Vec<SlotProfile>> {
    let profiles: Vec<SlotProfile> = serde_yml::from_str(yaml)?;
    validate_profiles(&profiles)?;
    log::debug!("Loaded {} slot profiles from YAML", profiles.len());
    Ok(profiles)
}

/// Export a profile list as pretty JSON
pub fn profiles_to_json(profiles: &[SlotProfile]) -> SimResult<String> {
    Ok(serde_json::to_string_pretty(profiles)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        let profiles = catalog();
        assert_eq!(profiles.len(), 4);
        validate_profiles(&profiles).unwrap();
    }

    #[test]
    fn test_default_tracked_exist_in_catalog() {
        let profiles = catalog();
        for id in default_tracked() {
            assert!(profiles.iter().any(|p| p.id == id), "missing {id}");
        }
    }

    #[test]
    fn test_rejects_bad_hit_frequency() {
        let profile = SlotProfile::new("x", "X", 96.0, 0.0, 5.0);
        assert!(matches!(
            profile.validate(),
            Err(SimError::InvalidProfile { .. })
        ));

        let profile = SlotProfile::new("x", "X", 96.0, 1.2, 5.0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rtp() {
        assert!(SlotProfile::new("x", "X", 0.0, 0.3, 5.0).validate().is_err());
        assert!(SlotProfile::new("x", "X", 100.5, 0.3, 5.0).validate().is_err());
        assert!(SlotProfile::new("x", "X", 100.0, 0.3, 5.0).validate().is_ok());
    }

    #[test]
    fn test_volatility_bounds() {
        let mut profile = SlotProfile::book_of_dead();
        assert!(profile.set_volatility(20.0).is_ok());
        assert_eq!(profile.volatility, 20.0);

        assert!(matches!(
            profile.set_volatility(0.5),
            Err(SimError::VolatilityOutOfRange(_))
        ));
        assert_eq!(profile.volatility, 20.0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let profiles = vec![SlotProfile::razor_shark(), SlotProfile::razor_shark()];
        assert!(matches!(
            validate_profiles(&profiles),
            Err(SimError::DuplicateProfile(id)) if id == "razor-shark"
        ));
    }

    #[test]
    fn test_stake_options() {
        assert!(is_stake_option(0.2));
        assert!(is_stake_option(100.0));
        assert!(!is_stake_option(3.0));
        assert!(validate_stake(0.3).is_err());
    }

    #[test]
    fn test_yaml_profiles() {
        let yaml = r#"
- id: test-slot
  name: Test Slot
  target_rtp: 95.0
  hit_frequency: 0.25
  volatility: 10.0
"#;
        let profiles = profiles_from_yaml(yaml).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].color, "#94a3b8");
    }

    #[test]
    fn test_json_export_import() {
        let json = profiles_to_json(&catalog()).unwrap();
        let back = profiles_from_json(&json).unwrap();
        assert_eq!(back, catalog());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            profiles_from_json("[{\"id\": 3}]"),
            Err(SimError::Serialization(_))
        ));
    }
}
