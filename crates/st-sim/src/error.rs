//! Error types for the simulator crate

use thiserror::Error;

/// Simulator error type
///
/// Only raised where data crosses a trust boundary (profile definitions,
/// stake selection, config text). Violated preconditions inside the
/// generator are programming defects and panic instead.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid profile '{id}': {reason}")]
    InvalidProfile { id: String, reason: String },

    #[error("Duplicate profile id: {0}")]
    DuplicateProfile(String),

    #[error("Volatility {0} outside [1, 20]")]
    VolatilityOutOfRange(f64),

    #[error("Stake {0} is not an available denomination")]
    InvalidStake(f64),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Serialization(e.to_string())
    }
}

impl From<serde_yml::Error> for SimError {
    fn from(e: serde_yml::Error) -> Self {
        SimError::Serialization(e.to_string())
    }
}

/// Result type alias
pub type SimResult<T> = Result<T, SimError>;
