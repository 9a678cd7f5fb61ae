//! Error types for the live session layer

use thiserror::Error;

use st_sim::SimError;

/// Live session error type
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No advisor attached")]
    NoAdvisor,

    #[error("Driver stalled: {0}")]
    Stalled(String),
}

/// Result type alias
pub type LiveResult<T> = Result<T, LiveError>;
