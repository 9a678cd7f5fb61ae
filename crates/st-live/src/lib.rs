//! # st-live — Live session layer for SlotTracker
//!
//! Wraps the simulator in a running session: a set of slot profiles, the
//! subset being tracked, one statistics record per slot, a global stake and
//! a simulated wallet. [`SimulationDriver`] ticks the session on a timer
//! thread and exposes read-only snapshots; the [`advisory`] module is the
//! seam to the external AI advisor.
//!
//! ```text
//! SimulationDriver
//!     ├── st-tick thread ──> Session::tick ──> run_batch × tracked (rayon)
//!     │                                   └──> SlotStatistics::apply, Wallet::settle
//!     └── st-advisory thread ──> digests ──> dyn Advisor ──> AdvisoryDesk
//! ```

pub mod advisory;
pub mod config;
pub mod driver;
pub mod error;
pub mod session;
pub mod wallet;

pub use advisory::{
    Advisor, AdvisoryDesk, AdvisoryError, BehavioralForecast, DeviationAdvisor, ForecastRefresh,
    LuckForecast, PortfolioDigest, SlotDigest, SlotInsight,
};
pub use config::SessionConfig;
pub use driver::SimulationDriver;
pub use error::{LiveError, LiveResult};
pub use session::{Session, SlotTickSummary, TickReport};
pub use wallet::Wallet;
