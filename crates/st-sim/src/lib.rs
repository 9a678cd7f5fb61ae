//! # st-sim — Spin outcome simulator for SlotTracker
//!
//! Generates statistically plausible slot outcomes from a small profile
//! (target RTP, hit frequency, volatility) and folds them into running
//! per-slot statistics whose live RTP drifts toward the profile's long-run
//! return.
//!
//! ## Architecture
//!
//! ```text
//! SlotProfile ──┐
//! UniformSource ┴─> generate() ─> SpinOutcome
//!                      │ × iterations
//!                      v
//!                 run_batch() ─> Vec<SpinOutcome>
//!                      │
//!                      v
//!          SlotStatistics::apply() ─> live RTP, history, trend
//! ```
//!
//! All randomness enters through [`UniformSource`]; seed a [`SeededSource`]
//! for reproducible runs or script a [`ScriptedSource`] to force branches.

pub mod batch;
pub mod config;
pub mod error;
pub mod outcome;
pub mod rng;
pub mod stats;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use outcome::*;
pub use rng::*;
pub use stats::*;
