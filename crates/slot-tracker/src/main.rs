//! SlotTracker headless runner
//!
//! Usage:
//!   slot-tracker run [--config session.yaml] [--ticks 10]   - Tick tracked slots on a timer
//!   slot-tracker simulate <slot> [--spins 200000]          - Offline convergence check
//!   slot-tracker profiles                                  - Print the built-in catalog

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use st_live::{DeviationAdvisor, SessionConfig, SimulationDriver};
use st_sim::{BatchSummary, SeededSource, analytic_rtp, catalog, profiles_to_json, run_batch};

#[derive(Parser)]
#[command(name = "slot-tracker", about = "SlotTracker simulation runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick tracked slots on a timer and report live statistics
    Run {
        /// Session config (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Ticks to run before exiting
        #[arg(short, long, default_value_t = 10)]
        ticks: u64,
        /// Override the tick interval (ms)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Override the master seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override the global stake
        #[arg(long)]
        stake: Option<f64>,
        /// Track these slots instead of the configured ones
        #[arg(long = "track")]
        track: Vec<String>,
        /// Print final snapshots as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate many spins for one catalog slot and compare RTPs
    Simulate {
        /// Catalog slot id
        slot: String,
        #[arg(short, long, default_value_t = 200_000)]
        spins: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Override volatility
        #[arg(long)]
        volatility: Option<f64>,
    },
    /// Print the built-in slot catalog as JSON
    Profiles,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            interval_ms,
            seed,
            stake,
            track,
            json,
        } => {
            let mut session_config = match config {
                Some(path) => SessionConfig::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => SessionConfig::default(),
            };
            if let Some(ms) = interval_ms {
                session_config.tick_interval_ms = ms;
            }
            if seed.is_some() {
                session_config.seed = seed;
            }
            if let Some(stake) = stake {
                session_config.stake = stake;
            }
            if !track.is_empty() {
                session_config.tracked = track;
            }
            session_config.validate()?;
            run(session_config, ticks, json)
        }
        Commands::Simulate {
            slot,
            spins,
            seed,
            volatility,
        } => simulate(&slot, spins, seed, volatility),
        Commands::Profiles => {
            println!("{}", profiles_to_json(&catalog())?);
            Ok(())
        }
    }
}

fn run(config: SessionConfig, ticks: u64, json: bool) -> Result<()> {
    if ticks == 0 {
        bail!("--ticks must be at least 1");
    }

    // a tick that takes this long means the driver is wedged
    let stall_timeout = (config.tick_interval() * 10).max(Duration::from_secs(5));
    let mut driver =
        SimulationDriver::new(config)?.with_advisor(Arc::new(DeviationAdvisor::default()));
    if driver.is_paused() {
        log::info!("Config starts paused; resuming for a bounded run");
        driver.resume();
    }
    log::info!("Starting SlotTracker for {} ticks...", ticks);
    driver.start()?;

    let mut reported = 0;
    while reported < ticks {
        let done = driver
            .wait_for_ticks(reported + 1, stall_timeout)
            .context("Simulation stopped making progress")?;
        if let Some(report) = driver.last_report() {
            for slot in &report.slots {
                log::info!(
                    "{:<18} live RTP {:>7.2}%  {:?}  max {:.2}x",
                    slot.id,
                    slot.live_rtp,
                    slot.trend,
                    slot.batch.max_multiplier
                );
            }
            log::info!("balance {:.2}", report.balance);
        }
        reported = done;
    }
    driver.stop();

    if json {
        let snapshots: Vec<_> = driver.snapshots().into_iter().map(|(_, s)| s).collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        for (profile, stats) in driver.snapshots() {
            let insight = if stats.total_spins() > 0 {
                let insight = driver.refresh_insight(&profile.id)?;
                format!("{:?}: {}", insight.luck_forecast, insight.commentary)
            } else {
                String::new()
            };
            println!(
                "{:<18} spins {:>7}  live RTP {:>7.2}% (target {:.2}%)  max {:>8.2}x  {}",
                profile.name,
                stats.total_spins(),
                stats.live_rtp(),
                profile.target_rtp,
                stats.max_multiplier(),
                insight
            );
        }
        println!("Balance: {:.2}", driver.balance());
    }
    Ok(())
}

fn simulate(slot: &str, spins: usize, seed: u64, volatility: Option<f64>) -> Result<()> {
    let mut profile = catalog()
        .into_iter()
        .find(|p| p.id == slot)
        .with_context(|| format!("Unknown slot: {slot}"))?;
    if let Some(v) = volatility {
        profile.set_volatility(v)?;
    }
    if spins == 0 {
        bail!("--spins must be at least 1");
    }

    let batch = run_batch(&profile, spins, 1.0, &mut SeededSource::new(seed));
    let summary = BatchSummary::of(&batch);

    println!("{} (volatility {:.1})", profile.name, profile.volatility);
    println!("  spins           {}", summary.spins);
    println!(
        "  hit rate        {:.4} (configured {:.4})",
        summary.hits as f64 / summary.spins as f64,
        profile.hit_frequency
    );
    println!("  empirical RTP   {:.2}%", summary.rtp().unwrap_or(0.0));
    println!("  analytic RTP    {:.2}%", analytic_rtp(&profile));
    println!("  target RTP      {:.2}%", profile.target_rtp);
    println!("  max multiplier  {:.2}x", summary.max_multiplier);
    Ok(())
}
