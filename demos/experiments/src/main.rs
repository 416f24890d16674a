//! experiments: runs the CPS beat catalogue end to end.
//!
//! Every run wires an in-process bus, a simulated worker that answers the
//! analysis requests, and a coordinator that drives a system clock plus two
//! CPS twins through virtual time.  `RUST_LOG` takes precedence over
//! `--log-level`.
//!
//! ```text
//! experiments 7                      # chaotic (off the beat)
//! experiments --list
//! experiments --roster plant.csv --until 1/3 --mute cps2
//! ```

mod catalogue;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use cps_agent::CycleObserver;
use cps_bus::{BusRequester, DEFAULT_TOPIC, LocalBus, SimulatedWorker, WorkerConfig};
use cps_core::{AgentId, Ratio, SimConfig, StepKind, Tick};
use cps_schedule::load_roster_csv;
use cps_sim::{CoordinatorBuilder, SimObserver, route_completions};
use tracing::info;

use catalogue::{BASE_CYCLE_LENGTH, Experiment, IDS};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "experiments")]
#[command(about = "Run the CPS beat experiments against an in-process worker", long_about = None)]
struct Args {
    /// Experiment id (1-14)
    #[arg(default_value = "1")]
    experiment: u8,

    /// Print the catalogue and exit
    #[arg(long)]
    list: bool,

    /// Run the agents in this CSV instead of the catalogue roster
    #[arg(long, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Horizon of a --roster run, in time units ("180", "1/3", "0.5")
    #[arg(long, default_value = "180")]
    until: Ratio,

    /// Ticks per time unit
    #[arg(long, default_value = "3600")]
    ticks_per_unit: u64,

    /// Seed for the worker's latency and duplicate draws
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Upper bound of the worker's reply latency in milliseconds
    #[arg(long, default_value = "5")]
    latency_ms: u64,

    /// Real-time deadline per request in milliseconds (0 waits forever)
    #[arg(long, default_value = "60000")]
    reply_timeout_ms: u64,

    /// Retire an agent after this many stalled cycles in a row (0 never)
    #[arg(long, default_value = "3")]
    max_stalls: u32,

    /// Probability that the worker delivers a completion twice
    #[arg(long, default_value = "0.0")]
    duplicates: f64,

    /// Agent whose requests the worker never answers (repeatable)
    #[arg(long, value_name = "NAME")]
    mute: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs one line per finished segment.
#[derive(Default)]
struct SegmentReport {
    fired:        u64,
    fired_before: u64,
    timeouts:     u64,
    segments:     usize,
}

impl CycleObserver for SegmentReport {
    fn on_step_timed_out(&mut self, _agent: AgentId, _step: StepKind, _at: Tick) {
        self.timeouts += 1;
    }
}

impl SimObserver for SegmentReport {
    fn on_event_fired(&mut self, _at: Tick, _agent: AgentId) {
        self.fired += 1;
    }

    fn on_segment_end(&mut self, until: Tick) {
        self.segments += 1;
        info!(
            segment = self.segments,
            %until,
            events = self.fired - self.fired_before,
            timeouts = self.timeouts,
            "segment complete"
        );
        self.fired_before = self.fired;
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list {
        for id in IDS {
            if let Some(e) = catalogue::experiment(id)? {
                println!("{:>2}  {:<44} until {:<10} {} segment(s)", e.id, e.title, e.until(), e.segments.len());
            }
        }
        return Ok(());
    }

    let experiment = match &args.roster {
        Some(path) => {
            let roster = load_roster_csv(path).with_context(|| format!("loading roster {}", path.display()))?;
            Experiment::custom(roster, args.until)
        }
        None => catalogue::experiment(args.experiment)?
            .with_context(|| format!("no experiment {} (expected {}-{})", args.experiment, IDS.start(), IDS.end()))?,
    };

    let config = SimConfig {
        ticks_per_unit:         args.ticks_per_unit,
        base_cycle_length:      BASE_CYCLE_LENGTH,
        until:                  experiment.until(),
        reply_timeout_ms:       (args.reply_timeout_ms > 0).then_some(args.reply_timeout_ms),
        max_consecutive_stalls: (args.max_stalls > 0).then_some(args.max_stalls),
        seed:                   args.seed,
    };

    info!(id = experiment.id, title = experiment.title, agents = experiment.roster.len(), "realizing experiment");
    run(&experiment, config, &args)
}

fn run(experiment: &Experiment, config: SimConfig, args: &Args) -> Result<()> {
    // 1. Bus and worker.
    let bus = Arc::new(LocalBus::new()?);
    let worker_config = WorkerConfig {
        latency_ms: 0..=args.latency_ms,
        duplicate_probability: args.duplicates,
        seed: config.seed,
        ..args.mute.iter().fold(WorkerConfig::default(), |c, name| c.mute(name.as_str()))
    };
    let mut worker = SimulatedWorker::attach(Arc::clone(&bus), worker_config)?;

    // 2. Coordinator, with completions routed back into its tracker.
    let mut coordinator = CoordinatorBuilder::new(config, BusRequester::new(Arc::clone(&bus), "worker"))
        .agents(experiment.roster.iter().cloned())
        .build()?;
    route_completions(&*bus, DEFAULT_TOPIC, coordinator.completion_router())?;

    // 3. Segments.
    let started = Instant::now();
    let mut report = SegmentReport::default();
    for segment in &experiment.segments {
        for (name, period) in &segment.retune {
            coordinator.set_cycle_period(name, *period)?;
            info!(agent = *name, %period, "cycle period re-tuned");
        }
        coordinator.run_until(segment.until, &mut report)?;
    }

    worker.stop();
    bus.flush()?;

    let stats = worker.stats();
    println!();
    println!("{}", coordinator.summary());
    println!(
        "worker: {} received, {} answered, {} muted, {} duplicates, {} malformed",
        stats.received, stats.answered, stats.muted, stats.duplicates, stats.malformed
    );
    println!("wall time: {:.2?}", started.elapsed());

    bus.shutdown();
    Ok(())
}

/// Install the `fmt` subscriber.  `RUST_LOG` wins over `level`.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
    Ok(())
}
