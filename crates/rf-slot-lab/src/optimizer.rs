//! Reel optimizer
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  spawn   ┌─────────────────────┐
//! │ producer thread    │─────────►│ rayon worker pool   │
//! │ (rf-reel-producer) │          │ (rf-reel-worker-N)  │
//! └─────────┬──────────┘          └──────────┬──────────┘
//!           │ task handle                    │ result
//!           ▼                                ▼
//! ┌────────────────────┐  recv    ┌─────────────────────┐
//! │ bounded queue      │─────────►│ consumer (caller)   │
//! │ history × K        │          │ history, best, cb   │
//! └────────────────────┘          └─────────────────────┘
//! ```
//!
//! The queue carries one-shot receivers, not results, so the consumer sees
//! candidates in submission order whatever order the pool finishes them in.
//! Only the consumer touches the history buffer, the best candidate and the
//! callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

use rf_core::{RfError, RfResult};

use crate::config::OptimizerConfig;
use crate::generator::{CandidateGenerator, GeneratedResult, GeneratorFactory, NestedBoundsFactory};
use crate::reel::VirtualReel;
use crate::stop::StopCondition;

/// Slack allowed above the target before a candidate counts as invalid
pub const RTP_EPSILON: f64 = 1e-9;

type TaskHandle = Receiver<RfResult<GeneratedResult>>;

/// Callback fired on every new best
pub type NewBestCallback = Box<dyn FnMut(f64, &VirtualReel) + Send>;

/// Optimizer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    Idle,
    Running,
    Stopped,
}

/// Totals reported by a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Candidates evaluated by the consumer
    pub runs: u64,
    /// Failed or out-of-range candidates
    pub failures: u64,
    /// Times the best candidate was replaced
    pub improvements: u64,
    pub elapsed: Duration,
    pub best_rtp: f64,
    pub best_size: Option<usize>,
}

impl RunSummary {
    /// Evaluated candidates per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.runs as f64 / secs } else { 0.0 }
    }
}

#[derive(Debug, Clone)]
struct Best {
    rtp: f64,
    reel: VirtualReel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Invalid,
    Kept,
    Improved,
}

/// Searches for the smallest reel with the highest RTP not above the target
pub struct ReelOptimizer {
    config: OptimizerConfig,
    history: Vec<f64>,
    best: Option<Best>,
    on_new_best: Option<NewBestCallback>,
    state: OptimizerState,
}

impl ReelOptimizer {
    /// Optimizer over the standard paytable
    pub fn new(history_size: usize, target_rtp: f64) -> RfResult<Self> {
        Self::with_config(
            OptimizerConfig::default()
                .with_history(history_size)
                .with_target(target_rtp),
        )
    }

    pub fn with_config(config: OptimizerConfig) -> RfResult<Self> {
        config.validate()?;
        Ok(Self {
            history: vec![0.0; config.history_size],
            config,
            best: None,
            on_new_best: None,
            state: OptimizerState::Idle,
        })
    }

    /// Register the new-best callback, replacing any previous one
    pub fn on_new_best<F>(&mut self, callback: F)
    where
        F: FnMut(f64, &VirtualReel) + Send + 'static,
    {
        self.on_new_best = Some(Box::new(callback));
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn best_reel(&self) -> Option<&VirtualReel> {
        self.best.as_ref().map(|b| &b.reel)
    }

    /// RTP of the best candidate, 0.0 before one is found
    pub fn best_rtp(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |b| b.rtp)
    }

    /// Run with nested-bounds generators seeded from the configuration
    pub fn run<S>(&mut self, stop: S) -> RfResult<RunSummary>
    where
        S: StopCondition + 'static,
    {
        let factory = NestedBoundsFactory::new(&self.config);
        self.run_with(stop, factory)
    }

    /// Run with a caller-supplied generator factory
    ///
    /// Blocks until `stop` trips on the consumer side or the producer runs
    /// out of work. One run per optimizer.
    pub fn run_with<S, F>(&mut self, stop: S, factory: F) -> RfResult<RunSummary>
    where
        S: StopCondition + 'static,
        F: GeneratorFactory,
    {
        if self.state != OptimizerState::Idle {
            return Err(RfError::State(format!(
                "optimizer already used (state {:?})",
                self.state
            )));
        }

        let capacity = self.config.queue_capacity();
        let workers = self.config.worker_count();
        let pool = build_pool(workers)?;

        log::info!(
            "Reel optimizer starting: history={}, target={}, queue={}, workers={}",
            self.config.history_size,
            self.config.target_rtp,
            capacity,
            workers
        );

        let stop = Arc::new(stop);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (task_tx, task_rx) = bounded::<TaskHandle>(capacity);

        let producer = {
            let stop = Arc::clone(&stop);
            let cancelled = Arc::clone(&cancelled);
            thread::Builder::new()
                .name("rf-reel-producer".into())
                .spawn(move || produce(stop, factory, pool, task_tx, cancelled))?
        };

        self.state = OptimizerState::Running;
        let started = Instant::now();
        let mut summary = RunSummary {
            runs: 0,
            failures: 0,
            improvements: 0,
            elapsed: Duration::ZERO,
            best_rtp: 0.0,
            best_size: None,
        };

        while stop.apply(summary.runs) {
            // Err: producer finished and the queue is drained
            let Ok(handle) = task_rx.recv() else {
                break;
            };
            let outcome = handle
                .recv()
                .unwrap_or_else(|_| Err(RfError::Generation("task aborted".into())));

            match self.evaluate(summary.runs, outcome) {
                Verdict::Invalid => summary.failures += 1,
                Verdict::Improved => summary.improvements += 1,
                Verdict::Kept => {}
            }
            summary.runs += 1;
        }

        // Wake a producer blocked on a full queue, skip tasks not yet started
        cancelled.store(true, Ordering::Relaxed);
        drop(task_rx);
        let joined = producer.join();
        self.state = OptimizerState::Stopped;
        let submitted = joined.map_err(|_| RfError::State("producer thread panicked".into()))?;

        summary.elapsed = started.elapsed();
        summary.best_rtp = self.best_rtp();
        summary.best_size = self.best_reel().map(VirtualReel::size);

        log::debug!(
            "Producer stopped after {submitted} submissions, {} abandoned",
            submitted.saturating_sub(summary.runs)
        );
        log::info!(
            "Reel optimizer finished: runs={}, failures={}, best_rtp={:.6}, best_size={:?}, elapsed={:.2?}",
            summary.runs,
            summary.failures,
            summary.best_rtp,
            summary.best_size,
            summary.elapsed
        );

        Ok(summary)
    }

    /// Apply the acceptance rules to the candidate of run `run_index`
    fn evaluate(&mut self, run_index: u64, outcome: RfResult<GeneratedResult>) -> Verdict {
        let candidate = match outcome {
            Ok(candidate) => candidate,
            Err(e) => {
                log::warn!("Generation task {run_index} failed: {e}");
                return Verdict::Invalid;
            }
        };

        let rtp = candidate.rtp;
        if !rtp.is_finite() || rtp < 0.0 || rtp > self.config.target_rtp + RTP_EPSILON {
            log::warn!(
                "Generation task {run_index} discarded: rtp {rtp} outside [0, {}]",
                self.config.target_rtp
            );
            return Verdict::Invalid;
        }
        if candidate.reel_bytes.is_empty() {
            log::warn!("Generation task {run_index} discarded: empty reel");
            return Verdict::Invalid;
        }

        let index = (run_index % self.history.len() as u64) as usize;
        let eligible = rtp >= self.history[index];
        self.history[index] = rtp;

        if !eligible || !self.improves_on_best(rtp, candidate.size()) {
            return Verdict::Kept;
        }

        let reel = match candidate.into_reel() {
            Ok(reel) => reel,
            Err(e) => {
                log::warn!("Generation task {run_index} discarded: {e}");
                return Verdict::Invalid;
            }
        };

        log::debug!("New best at run {run_index}: rtp={rtp:.6}, size={}", reel.size());
        if let Some(callback) = self.on_new_best.as_mut() {
            callback(rtp, &reel);
        }
        self.best = Some(Best { rtp, reel });
        Verdict::Improved
    }

    /// Higher RTP wins; equal or higher RTP on a strictly smaller reel also wins
    fn improves_on_best(&self, rtp: f64, size: usize) -> bool {
        match &self.best {
            None => true,
            Some(best) => rtp > best.rtp || (rtp >= best.rtp && size < best.reel.size()),
        }
    }
}

impl std::fmt::Debug for ReelOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReelOptimizer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("best_rtp", &self.best_rtp())
            .finish_non_exhaustive()
    }
}

fn build_pool(workers: usize) -> RfResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("rf-reel-worker-{i}"))
        .panic_handler(|_| log::error!("Reel generation task panicked"))
        .build()
        .map_err(|e| RfError::State(format!("failed to build worker pool: {e}")))
}

/// Producer loop; returns the number of submitted tasks
///
/// Owns the pool, which is dropped (without waiting) on exit.
fn produce<S, F>(
    stop: Arc<S>,
    mut factory: F,
    pool: ThreadPool,
    tasks: Sender<TaskHandle>,
    cancelled: Arc<AtomicBool>,
) -> u64
where
    S: StopCondition,
    F: GeneratorFactory,
{
    let mut submitted = 0u64;

    while stop.apply(submitted) && !cancelled.load(Ordering::Relaxed) {
        let generator = factory.create(submitted);
        let (result_tx, result_rx) = bounded(1);
        let skip = Arc::clone(&cancelled);

        pool.spawn(move || {
            if skip.load(Ordering::Relaxed) {
                return;
            }
            // receiver gone means the result was abandoned
            let _ = result_tx.send(generator.generate());
        });

        if tasks.send(result_rx).is_err() {
            break;
        }
        submitted += 1;
    }

    submitted
}
