//! Stop conditions polled by the optimizer loops

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Predicate over work done so far; `true` means keep going
///
/// Polled from both the producer and the consumer thread, so it must be cheap
/// and free of interior state that depends on who calls it.
pub trait StopCondition: Send + Sync {
    fn apply(&self, run_count: u64) -> bool;
}

/// Wall-clock budget measured from construction
#[derive(Debug, Clone, Copy)]
pub struct TimeBound {
    start: Instant,
    duration: Duration,
}

impl TimeBound {
    pub fn new(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    /// Budget left before the bound trips
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.start.elapsed())
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl StopCondition for TimeBound {
    #[inline]
    fn apply(&self, _run_count: u64) -> bool {
        self.start.elapsed() < self.duration
    }
}

/// Fixed number of runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountBound {
    max_runs: u64,
}

impl CountBound {
    pub fn new(max_runs: u64) -> Self {
        Self { max_runs }
    }

    pub fn max_runs(&self) -> u64 {
        self.max_runs
    }
}

impl StopCondition for CountBound {
    #[inline]
    fn apply(&self, run_count: u64) -> bool {
        run_count < self.max_runs
    }
}

impl<S: StopCondition + ?Sized> StopCondition for Box<S> {
    fn apply(&self, run_count: u64) -> bool {
        (**self).apply(run_count)
    }
}

impl<S: StopCondition + ?Sized> StopCondition for Arc<S> {
    fn apply(&self, run_count: u64) -> bool {
        (**self).apply(run_count)
    }
}
