//! ReelForge reel generator
//!
//! Usage:
//!   reelgen optimize [--seconds S | --runs N]   - Search for a reel under the target RTP
//!   reelgen inspect <ENCODED> [--config C]       - Decode a reel and print its statistics
//!   reelgen simulate [ENCODED] --spins N         - Spin a reel and compare empirical RTP
//!
//! `inspect` and `simulate` price reels with the paytable from `--config`,
//! or the standard table when none is given.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use rf_slot_lab::{
    CountBound, DEMO_REEL, OptimizerConfig, PayTable, ReelMachine, ReelOptimizer, StopCondition,
    TimeBound, VirtualReel,
};

/// Budget used when neither `--seconds` nor `--runs` is given
const DEFAULT_SECONDS: f64 = 10.0;

#[derive(Parser)]
#[command(name = "reelgen", about = "ReelForge reel generation and RTP optimization", version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the optimizer
    Optimize {
        /// Optimizer config (.json, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Wall-clock budget in seconds
        #[arg(long, conflicts_with = "runs")]
        seconds: Option<f64>,
        /// Number of candidates to evaluate
        #[arg(long)]
        runs: Option<u64>,
        /// History buffer size
        #[arg(long)]
        history: Option<usize>,
        /// Target RTP ceiling
        #[arg(long)]
        target: Option<f64>,
        /// Master seed
        #[arg(long)]
        seed: Option<u64>,
        /// Worker threads (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
        /// Write the best encoded reel to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a reel and print size, RTP and symbol histogram
    Inspect {
        /// Encoded reel (gzip + base64)
        encoded: String,
        /// Config whose paytable prices the reel
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Spin a reel and report empirical vs theoretical RTP
    Simulate {
        /// Encoded reel (defaults to the demo machine)
        encoded: Option<String>,
        /// Number of spins
        #[arg(long, default_value_t = 1_000_000)]
        spins: u64,
        /// Credits bet per spin
        #[arg(long, default_value_t = 1)]
        bet: u64,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Config whose paytable prices the reel
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Optimize {
            config,
            seconds,
            runs,
            history,
            target,
            seed,
            workers,
            output,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => OptimizerConfig::production(),
            };
            if let Some(history) = history {
                config.history_size = history;
            }
            if let Some(target) = target {
                config.target_rtp = target;
            }
            if let Some(workers) = workers {
                config.worker_threads = workers;
            }
            config.seed = seed.or(config.seed);
            let stop = stop_condition(seconds, runs)?;
            optimize(config, stop, output)
        }
        Commands::Inspect { encoded, config } => {
            let paytable = load_paytable(config.as_deref())?;
            inspect(&encoded, &paytable)
        }
        Commands::Simulate {
            encoded,
            spins,
            bet,
            seed,
            config,
        } => {
            let paytable = load_paytable(config.as_deref())?;
            simulate(encoded.as_deref().unwrap_or(DEMO_REEL), spins, bet, seed, paytable)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> Result<OptimizerConfig> {
    OptimizerConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Paytable from a config file, standard table otherwise
fn load_paytable(config: Option<&Path>) -> Result<PayTable> {
    match config {
        Some(path) => Ok(load_config(path)?.paytable),
        None => Ok(PayTable::standard()),
    }
}

fn stop_condition(seconds: Option<f64>, runs: Option<u64>) -> Result<Box<dyn StopCondition>> {
    if let Some(runs) = runs {
        return Ok(Box::new(CountBound::new(runs)));
    }
    let seconds = seconds.unwrap_or(DEFAULT_SECONDS);
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("--seconds must be a non-negative number, got {seconds}");
    }
    Ok(Box::new(TimeBound::new(Duration::from_secs_f64(seconds))))
}

fn optimize(
    config: OptimizerConfig,
    stop: Box<dyn StopCondition>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut optimizer = ReelOptimizer::with_config(config).context("Invalid optimizer config")?;
    optimizer.on_new_best(|rtp, reel| {
        log::info!("New best: rtp={rtp:.6} size={} reel={reel}", reel.size());
    });

    let summary = optimizer.run(stop).context("Optimizer run failed")?;

    println!("Runs:         {}", summary.runs);
    println!("Failures:     {}", summary.failures);
    println!("Improvements: {}", summary.improvements);
    println!("Elapsed:      {:.2?}", summary.elapsed);
    println!("Throughput:   {:.0} runs/s", summary.throughput());

    let Some(best) = optimizer.best_reel() else {
        println!("No candidate accepted");
        return Ok(());
    };
    let encoded = best.encode().context("Failed to encode best reel")?;
    println!("Best RTP:     {:.6}", summary.best_rtp);
    println!("Best size:    {}", best.size());
    println!("{encoded}");

    if let Some(path) = output {
        std::fs::write(&path, format!("{encoded}\n"))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Best reel written to {}", path.display());
    }
    Ok(())
}

fn inspect(encoded: &str, paytable: &PayTable) -> Result<()> {
    let reel = VirtualReel::decode(encoded).context("Failed to decode reel")?;
    let rtp = paytable.rtp_of(reel.as_bytes()).context("Reel holds unmapped symbols")?;

    println!("Size: {}", reel.size());
    println!("RTP:  {rtp:.6}");
    println!("Symbol  Count   Share");
    for (symbol, &count) in reel.symbol_counts().iter().enumerate() {
        if count == 0 {
            continue;
        }
        println!(
            "{symbol:>6}  {count:>6}  {:>6.2}%",
            100.0 * count as f64 / reel.size() as f64
        );
    }
    Ok(())
}

fn simulate(
    encoded: &str,
    spins: u64,
    bet: u64,
    seed: Option<u64>,
    paytable: PayTable,
) -> Result<()> {
    let reel = VirtualReel::decode(encoded).context("Failed to decode reel")?;
    let mut machine = ReelMachine::new(reel, Arc::new(paytable), seed);
    let theoretical = machine.theoretical_rtp().context("Reel holds unmapped symbols")?;

    let stats = machine.simulate(spins, bet).context("Simulation failed")?;
    println!("Spins:            {}", stats.total_spins);
    println!("Total bet:        {}", stats.total_bet);
    println!("Total win:        {}", stats.total_win);
    println!("Max win:          {}", stats.max_win);
    println!("Hit rate:         {:.4}", stats.hit_rate());
    println!("Empirical RTP:    {:.6}", stats.rtp());
    println!("Theoretical RTP:  {theoretical:.6}");
    Ok(())
}
