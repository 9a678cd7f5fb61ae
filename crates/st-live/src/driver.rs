//! Periodic simulation driver
//!
//! Owns a [`Session`] behind a lock and runs it on a timer thread. A second
//! thread refreshes the behavioral forecast when an [`Advisor`] is attached;
//! slot insights are fetched on demand. Both threads share one stop channel:
//! dropping its sender wakes and ends them.
//!
//! A tick runs entirely under the session write lock, so readers see either
//! the state before a tick or the state after it, never a partial fold.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::{Mutex, RwLock};

use st_sim::{SeededSource, SlotProfile, SlotStatistics};

use crate::advisory::{
    Advisor, AdvisoryDesk, BehavioralForecast, ForecastRefresh, PortfolioDigest, SlotDigest,
    SlotInsight,
};
use crate::config::SessionConfig;
use crate::error::{LiveError, LiveResult};
use crate::session::{Session, TickReport};
use crate::wallet::Wallet;

/// State shared between the driver handle and its threads
struct DriverShared {
    session: RwLock<Session>,
    rng: Mutex<SeededSource>,
    paused: AtomicBool,
    ticks: AtomicU64,
    last_report: RwLock<Option<TickReport>>,
    desk: RwLock<AdvisoryDesk>,
    /// Held for a whole advisory refresh so concurrent refreshes queue up
    refresh_guard: Mutex<()>,
}

impl DriverShared {
    fn tick(&self) -> Option<TickReport> {
        if self.paused.load(Ordering::Acquire) {
            return None;
        }

        let report = {
            let mut rng = self.rng.lock();
            let mut session = self.session.write();
            session.tick(&mut rng)
        };
        let n = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!(
            "Tick {}: {} spins, net {:.2}, balance {:.2}",
            n,
            report.totals.spins,
            report.totals.net(),
            report.balance
        );

        *self.last_report.write() = Some(report.clone());
        Some(report)
    }

    fn portfolio_digest(&self) -> PortfolioDigest {
        let session = self.session.read();
        PortfolioDigest::new(
            session.all_statistics().into_iter().map(|(_, s)| s),
            session.wallet().balance(),
        )
    }

    fn slot_digest(&self, id: &str) -> LiveResult<SlotDigest> {
        let session = self.session.read();
        match (session.profile(id), session.statistics(id)) {
            (Some(profile), Some(stats)) => Ok(SlotDigest::new(profile, stats)),
            _ => Err(LiveError::UnknownSlot(id.to_string())),
        }
    }

    /// One forecast cycle. The advisor is called with neither the session
    /// nor the desk lock held; readers keep seeing the previous results.
    fn refresh_forecast(&self, advisor: &dyn Advisor) -> ForecastRefresh {
        let _guard = self.refresh_guard.lock();
        let portfolio = self.portfolio_digest();

        let mut desk = self.desk.read().clone();
        let outcome = desk.refresh_forecast(advisor, &portfolio);
        *self.desk.write() = desk;

        if outcome == ForecastRefresh::Updated {
            log::debug!("Behavioral forecast updated");
        }
        outcome
    }

    fn refresh_insight(&self, advisor: &dyn Advisor, id: &str) -> LiveResult<SlotInsight> {
        let digest = self.slot_digest(id)?;
        let _guard = self.refresh_guard.lock();

        let mut desk = self.desk.read().clone();
        let insight = desk.refresh_insight(advisor, &digest).clone();
        *self.desk.write() = desk;
        Ok(insight)
    }
}

/// Timer-driven owner of a simulation session
pub struct SimulationDriver {
    shared: Arc<DriverShared>,
    tick_interval: Duration,
    advisory_interval: Duration,
    advisor: Option<Arc<dyn Advisor>>,
    stop_tx: Option<Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl SimulationDriver {
    /// Create a stopped driver
    pub fn new(config: SessionConfig) -> LiveResult<Self> {
        let session = Session::new(&config)?;

        Ok(Self {
            shared: Arc::new(DriverShared {
                session: RwLock::new(session),
                rng: Mutex::new(SeededSource::from_optional_seed(config.seed)),
                paused: AtomicBool::new(config.paused),
                ticks: AtomicU64::new(0),
                last_report: RwLock::new(None),
                desk: RwLock::new(AdvisoryDesk::new()),
                refresh_guard: Mutex::new(()),
            }),
            tick_interval: config.tick_interval(),
            advisory_interval: config.advisory_interval(),
            advisor: None,
            stop_tx: None,
            workers: Vec::new(),
        })
    }

    /// Attach an advisor; its refresh loop starts with the driver
    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════

    /// Spawn the timer thread (and the advisory thread, if attached).
    /// No-op when already running.
    pub fn start(&mut self) -> LiveResult<()> {
        if self.is_running() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        self.stop_tx = Some(stop_tx);

        let shared = self.shared.clone();
        let interval = self.tick_interval;
        let rx = stop_rx.clone();
        let tick_worker = thread::Builder::new()
            .name("st-tick".into())
            .spawn(move || {
                run_every(interval, &rx, || {
                    shared.tick();
                })
            });
        self.push_worker(tick_worker)?;

        if let Some(advisor) = self.advisor.clone() {
            let shared = self.shared.clone();
            let interval = self.advisory_interval;
            let advisory_worker = thread::Builder::new()
                .name("st-advisory".into())
                .spawn(move || {
                    shared.refresh_forecast(advisor.as_ref());
                    run_every(interval, &stop_rx, || {
                        shared.refresh_forecast(advisor.as_ref());
                    });
                });
            self.push_worker(advisory_worker)?;
        }

        log::info!(
            "Simulation driver started ({} ms interval)",
            self.tick_interval.as_millis()
        );
        Ok(())
    }

    fn push_worker(&mut self, spawned: std::io::Result<JoinHandle<()>>) -> LiveResult<()> {
        match spawned {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(LiveError::Io(e))
            }
        }
    }

    /// Stop all threads and wait for them. A tick already underway finishes.
    pub fn stop(&mut self) {
        // dropping the sender disconnects every worker's receiver
        self.stop_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Driver worker panicked");
            }
        }
        log::info!("Simulation driver stopped");
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Run one tick on the calling thread (skipped while paused)
    pub fn tick_now(&self) -> Option<TickReport> {
        self.shared.tick()
    }

    /// Run one forecast cycle on the calling thread.
    /// `None` when no advisor is attached.
    pub fn refresh_advisory_now(&self) -> Option<ForecastRefresh> {
        let advisor = self.advisor.as_ref()?;
        Some(self.shared.refresh_forecast(advisor.as_ref()))
    }

    /// Ask the advisor about one slot, tracked or not
    pub fn refresh_insight(&self, id: &str) -> LiveResult<SlotInsight> {
        let advisor = self.advisor.as_ref().ok_or(LiveError::NoAdvisor)?;
        self.shared.refresh_insight(advisor.as_ref(), id)
    }

    /// Block until at least `target` ticks have completed; returns the count.
    ///
    /// Fails instead of waiting forever when the driver is stopped, paused,
    /// has lost a worker, or misses `timeout`.
    pub fn wait_for_ticks(&self, target: u64, timeout: Duration) -> LiveResult<u64> {
        let deadline = Instant::now() + timeout;
        let poll = (self.tick_interval / 4)
            .clamp(Duration::from_millis(1), Duration::from_millis(50));

        loop {
            let done = self.ticks_completed();
            if done >= target {
                return Ok(done);
            }
            if !self.is_running() {
                return Err(LiveError::Stalled("driver is not running".into()));
            }
            if self.is_paused() {
                return Err(LiveError::Stalled("driver is paused".into()));
            }
            if self.workers.iter().any(|h| h.is_finished()) {
                return Err(LiveError::Stalled("a driver worker exited".into()));
            }
            if Instant::now() >= deadline {
                return Err(LiveError::Stalled(format!(
                    "tick {} not reached within {:?}",
                    target, timeout
                )));
            }
            thread::sleep(poll);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // READ SIDE
    // ═══════════════════════════════════════════════════════════════════════

    pub fn ticks_completed(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    pub fn snapshot(&self, id: &str) -> Option<SlotStatistics> {
        self.shared.session.read().statistics(id).cloned()
    }

    /// Every slot's statistics, in profile order
    pub fn snapshots(&self) -> Vec<(SlotProfile, SlotStatistics)> {
        self.shared
            .session
            .read()
            .all_statistics()
            .into_iter()
            .map(|(p, s)| (p.clone(), s.clone()))
            .collect()
    }

    pub fn balance(&self) -> f64 {
        self.shared.session.read().wallet().balance()
    }

    pub fn wallet(&self) -> Wallet {
        self.shared.session.read().wallet().clone()
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.shared.last_report.read().clone()
    }

    pub fn insight(&self, id: &str) -> Option<SlotInsight> {
        self.shared.desk.read().insight(id).cloned()
    }

    pub fn forecast(&self) -> BehavioralForecast {
        self.shared.desk.read().forecast().clone()
    }

    pub fn portfolio_digest(&self) -> PortfolioDigest {
        self.shared.portfolio_digest()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WRITE SIDE (read at the next tick)
    // ═══════════════════════════════════════════════════════════════════════

    pub fn track(&self, id: &str) -> LiveResult<bool> {
        self.shared.session.write().track(id)
    }

    pub fn untrack(&self, id: &str) -> LiveResult<bool> {
        self.shared.session.write().untrack(id)
    }

    pub fn toggle_tracking(&self, id: &str) -> LiveResult<bool> {
        self.shared.session.write().toggle_tracking(id)
    }

    pub fn set_volatility(&self, id: &str, volatility: f64) -> LiveResult<()> {
        self.shared.session.write().set_volatility(id, volatility)
    }

    pub fn set_stake(&self, stake: f64) -> LiveResult<()> {
        self.shared.session.write().set_stake(stake)
    }

    pub fn add_profile(&self, profile: SlotProfile) -> LiveResult<()> {
        self.shared.session.write().add_profile(profile)
    }

    pub fn remove_profile(&self, id: &str) -> LiveResult<SlotProfile> {
        self.shared.session.write().remove_profile(id)
    }

    pub fn reset_statistics(&self) {
        self.shared.session.write().reset_statistics();
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

/// Call `f` every `interval` until the stop channel disconnects
fn run_every(interval: Duration, stop_rx: &Receiver<()>, mut f: impl FnMut()) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => f(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
