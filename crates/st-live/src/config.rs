//! Session configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use st_sim::{
    DEFAULT_BATCH_SIZE, DEFAULT_STAKE, SimError, SlotProfile, catalog, default_tracked,
    validate_profiles, validate_stake,
};

use crate::error::{LiveError, LiveResult};

/// Everything a session and its driver need to start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    /// Spins per tracked slot per tick
    pub batch_size: usize,
    /// Simulated wallet at session start
    pub initial_balance: f64,
    /// Global stake, one of the denominations
    pub stake: f64,
    /// Master seed (None = OS entropy)
    pub seed: Option<u64>,
    /// Seconds between advisory refreshes
    pub advisory_interval_secs: u64,
    /// Start paused
    pub paused: bool,
    /// Available slots
    pub profiles: Vec<SlotProfile>,
    /// Ids tracked at start
    pub tracked: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            batch_size: DEFAULT_BATCH_SIZE,
            initial_balance: 10_000.0,
            stake: DEFAULT_STAKE,
            seed: None,
            advisory_interval_secs: 45,
            paused: false,
            profiles: catalog(),
            tracked: default_tracked(),
        }
    }
}

impl SessionConfig {
    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> LiveResult<Self> {
        let config: Self = serde_yml::from_str(yaml).map_err(SimError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON
    pub fn from_json_str(json: &str) -> LiveResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(SimError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> LiveResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(LiveError::Config(format!(
                "unsupported config extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Check ranges and cross-references
    pub fn validate(&self) -> LiveResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(LiveError::Config("tick_interval_ms must be > 0".into()));
        }
        if self.advisory_interval_secs == 0 {
            return Err(LiveError::Config("advisory_interval_secs must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(LiveError::Config("batch_size must be > 0".into()));
        }
        if !self.initial_balance.is_finite() {
            return Err(LiveError::Config("initial_balance must be finite".into()));
        }
        validate_stake(self.stake)?;
        validate_profiles(&self.profiles)?;

        for id in &self.tracked {
            if !self.profiles.iter().any(|p| &p.id == id) {
                return Err(LiveError::UnknownSlot(id.clone()));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn advisory_interval(&self) -> Duration {
        Duration::from_secs(self.advisory_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.profiles.len(), 4);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = SessionConfig::from_yaml_str("stake: 5.0\nseed: 9\n").unwrap();
        assert_eq!(config.stake, 5.0);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.initial_balance, 10_000.0);
        assert_eq!(config.tracked, default_tracked());
    }

    #[test]
    fn test_unknown_tracked_id() {
        let result = SessionConfig::from_json_str(r#"{"tracked": ["no-such-slot"]}"#);
        assert!(matches!(result, Err(LiveError::UnknownSlot(id)) if id == "no-such-slot"));
    }

    #[test]
    fn test_invalid_stake() {
        let result = SessionConfig::from_yaml_str("stake: 3.0\n");
        assert!(matches!(result, Err(LiveError::Sim(SimError::InvalidStake(_)))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let result = SessionConfig::from_yaml_str("batch_size: 0\n");
        assert!(matches!(result, Err(LiveError::Config(_))));
    }

    #[test]
    fn test_zero_advisory_interval_rejected() {
        let result = SessionConfig::from_yaml_str("advisory_interval_secs: 0\n");
        assert!(matches!(result, Err(LiveError::Config(_))));

        let config = SessionConfig::from_yaml_str("advisory_interval_secs: 1\n").unwrap();
        assert_eq!(config.advisory_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = SessionConfig::from_yaml_str("stake: [1, 2");
        assert!(matches!(
            result,
            Err(LiveError::Sim(SimError::Serialization(_)))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let path =
            std::env::temp_dir().join(format!("st-live-config-{}.toml", std::process::id()));
        std::fs::write(&path, "stake = 1.0").unwrap();
        let result = SessionConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(LiveError::Config(_))));
    }

    #[test]
    fn test_load_yaml_file() {
        let path =
            std::env::temp_dir().join(format!("st-live-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "batch_size: 10\ntracked: [sweet-bonanza]\n").unwrap();
        let result = SessionConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        let config = result.unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.tracked, vec!["sweet-bonanza".to_string()]);
    }
}
