//! Candidate reel generation
//!
//! ## Nested-bounds sampling
//!
//! Counts are drawn from the highest-value symbol down, each from a window
//! starting one above the previous count:
//!
//! ```text
//! c[top] = rand[1, W)
//! c[k]   = rand[c[k+1] + 1, c[k+1] + W)      for k = top-1 .. 1
//! ```
//!
//! so rare, high-paying symbols get small counts and common, low-paying ones
//! large counts. Symbol `k` is written `c[k]` times, the payout summed, and
//! blank padding prepended if the raw RTP sits above the ceiling.

use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use rf_core::{RfError, RfResult, SeedSequence};

use crate::config::OptimizerConfig;
use crate::paytable::PayTable;
use crate::reel::{ReelBuilder, VirtualReel};
use crate::symbols::{BLANK, Symbol};

/// Outcome of one generation attempt
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResult {
    /// Exact RTP of `reel_bytes` under the paytable
    pub rtp: f64,
    /// Sorted symbol codes, blank padding first
    pub reel_bytes: Vec<Symbol>,
}

impl GeneratedResult {
    pub fn size(&self) -> usize {
        self.reel_bytes.len()
    }

    /// Fails only when the candidate holds no symbols
    pub fn into_reel(self) -> RfResult<VirtualReel> {
        VirtualReel::from_bytes(self.reel_bytes)
    }
}

/// One self-contained generation task
///
/// Consumed on use; runs on a pool worker with no access to optimizer state.
pub trait CandidateGenerator: Send + 'static {
    fn generate(self) -> RfResult<GeneratedResult>;
}

/// Creates a generator per submitted run
///
/// Called only from the producer thread, in submission order.
pub trait GeneratorFactory: Send + 'static {
    type Generator: CandidateGenerator;

    fn create(&mut self, run_index: u64) -> Self::Generator;
}

/// Longest reel a generator will build, padding included
pub const MAX_REEL_SIZE: usize = 1 << 28;

/// Minimum blank padding that brings `win_amount / (reel_size + zeros)` to
/// `max_rtp` or below
pub fn padding_for(win_amount: u64, reel_size: usize, max_rtp: f64) -> usize {
    if win_amount == 0 || max_rtp.is_nan() || max_rtp <= 0.0 {
        return 0;
    }
    let win = win_amount as f64;
    let exceeds = |zeros: usize| win / reel_size.saturating_add(zeros) as f64 > max_rtp;

    let mut zeros = (win / max_rtp - reel_size as f64).ceil().max(0.0) as usize;
    // closed form, corrected for rounding at the boundary
    while exceeds(zeros) {
        zeros += 1;
    }
    while zeros > 0 && !exceeds(zeros - 1) {
        zeros -= 1;
    }
    zeros
}

// ═══════════════════════════════════════════════════════════════════════════════
// NESTED-BOUNDS GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates one candidate reel from its own RNG
#[derive(Debug, Clone)]
pub struct ReelCandidateGenerator<R = ChaCha8Rng> {
    target_rtp: f64,
    bound: u32,
    paytable: Arc<PayTable>,
    rng: R,
}

impl<R: Rng> ReelCandidateGenerator<R> {
    pub fn new(target_rtp: f64, bound: u32, paytable: Arc<PayTable>, rng: R) -> Self {
        Self {
            target_rtp,
            bound,
            paytable,
            rng,
        }
    }

    /// Draw the nested-bounds chain, indexed by symbol code (index 0 stays 0)
    pub fn draw_counts(&mut self) -> Vec<usize> {
        let top = self.paytable.max_symbol() as usize;
        // window [lo + 1, lo + bound), never narrower than one value
        let width = self.bound.max(2) as usize - 1;

        let mut counts = vec![0usize; top + 1];
        let mut lo = 0usize;
        for symbol in (1..=top).rev() {
            lo = self.rng.random_range(lo + 1..=lo + width);
            counts[symbol] = lo;
        }
        counts
    }
}

impl<R: Rng + Send + 'static> CandidateGenerator for ReelCandidateGenerator<R> {
    fn generate(mut self) -> RfResult<GeneratedResult> {
        if self.bound == 0 {
            return Err(RfError::invalid_param("symbol window must be >= 1"));
        }
        if !self.target_rtp.is_finite() || self.target_rtp <= 0.0 {
            return Err(RfError::invalid_param(format!(
                "target_rtp must be finite and > 0, got {}",
                self.target_rtp
            )));
        }

        let counts = self.draw_counts();
        let size: usize = counts.iter().sum();
        if size > MAX_REEL_SIZE {
            return Err(RfError::Generation(format!(
                "drew {size} symbols, reels hold at most {MAX_REEL_SIZE}"
            )));
        }

        let mut builder = ReelBuilder::with_len(size);
        for (symbol, &count) in counts.iter().enumerate().skip(1) {
            builder.add_symbol(symbol as Symbol, count);
        }

        let win_amount = self.paytable.total_payout(builder.as_slice())?;
        let bytes = builder.into_bytes();
        if size == 0 || win_amount == 0 {
            return Ok(GeneratedResult {
                rtp: 0.0,
                reel_bytes: bytes,
            });
        }

        if win_amount as f64 / self.target_rtp > MAX_REEL_SIZE as f64 {
            return Err(RfError::Generation(format!(
                "win {win_amount} needs a reel longer than {MAX_REEL_SIZE} symbols"
            )));
        }
        let zeros = padding_for(win_amount, size, self.target_rtp);
        if size.saturating_add(zeros) > MAX_REEL_SIZE {
            return Err(RfError::Generation(format!(
                "win {win_amount} needs {zeros} blanks, reel would exceed {MAX_REEL_SIZE} symbols"
            )));
        }
        let reel_bytes = if zeros > 0 {
            let mut padded = vec![BLANK; zeros + size];
            padded[zeros..].copy_from_slice(&bytes);
            padded
        } else {
            bytes
        };

        Ok(GeneratedResult {
            rtp: win_amount as f64 / reel_bytes.len() as f64,
            reel_bytes,
        })
    }
}

/// Default factory: nested-bounds generators with per-run seeds
#[derive(Debug, Clone)]
pub struct NestedBoundsFactory {
    target_rtp: f64,
    bound: u32,
    paytable: Arc<PayTable>,
    seeds: SeedSequence,
}

impl NestedBoundsFactory {
    /// Seeded from `config.seed`, or from entropy when unset
    pub fn new(config: &OptimizerConfig) -> Self {
        Self::with_seeds(config, SeedSequence::from_option(config.seed))
    }

    pub fn with_seed(config: &OptimizerConfig, seed: u64) -> Self {
        Self::with_seeds(config, SeedSequence::new(seed))
    }

    fn with_seeds(config: &OptimizerConfig, seeds: SeedSequence) -> Self {
        Self {
            target_rtp: config.target_rtp,
            bound: config.symbol_window,
            paytable: Arc::new(config.paytable.clone()),
            seeds,
        }
    }

    pub fn master_seed(&self) -> u64 {
        self.seeds.master()
    }
}

impl GeneratorFactory for NestedBoundsFactory {
    type Generator = ReelCandidateGenerator<ChaCha8Rng>;

    fn create(&mut self, _run_index: u64) -> Self::Generator {
        ReelCandidateGenerator::new(
            self.target_rtp,
            self.bound,
            Arc::clone(&self.paytable),
            self.seeds.next_rng(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generator(target: f64, bound: u32, seed: u64) -> ReelCandidateGenerator {
        ReelCandidateGenerator::new(
            target,
            bound,
            Arc::new(PayTable::standard()),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_counts_are_nested() {
        for seed in 0..50 {
            let counts = generator(0.98, 256, seed).draw_counts();
            assert_eq!(counts.len(), 11);
            assert_eq!(counts[0], 0);
            assert!((1..=255).contains(&counts[10]));
            for k in 1..10 {
                assert!(counts[k] > counts[k + 1]);
                assert!(counts[k] < counts[k + 1] + 256);
            }
        }
    }

    #[test]
    fn test_bound_of_one_is_deterministic() {
        let counts = generator(0.98, 1, 9).draw_counts();
        assert_eq!(counts, vec![0, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_generate_respects_ceiling() {
        for seed in 0..100 {
            let result = generator(0.98, 256, seed).generate().unwrap();
            assert!(result.rtp > 0.0);
            assert!(result.rtp <= 0.98 + 1e-9, "rtp {} above ceiling", result.rtp);
            let table = PayTable::standard();
            let exact = table.rtp_of(&result.reel_bytes).unwrap();
            assert_eq!(exact, result.rtp);
        }
    }

    #[test]
    fn test_padding_goes_first() {
        let result = generator(0.5, 256, 4).generate().unwrap();
        let first_paying = result.reel_bytes.iter().position(|&s| s != BLANK).unwrap();
        assert!(first_paying > 0);
        assert!(result.reel_bytes[first_paying..].iter().all(|&s| s != BLANK));
        assert!(result.reel_bytes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_high_ceiling_needs_no_padding() {
        let result = generator(1000.0, 256, 1).generate().unwrap();
        assert!(result.reel_bytes.iter().all(|&s| s != BLANK));
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0, 10, 0.5), 0);
        assert_eq!(padding_for(5, 10, 0.5), 0);
        assert_eq!(padding_for(10, 10, 0.5), 10);
        assert_eq!(padding_for(11, 10, 0.5), 12);
        assert_eq!(padding_for(3479, 3550, 0.98), 0);
        assert_eq!(padding_for(3479, 3549, 0.98), 1);
    }

    #[test]
    fn test_padding_is_minimal() {
        for (win, size, target) in [(1234u64, 300usize, 0.98), (99_999, 17, 0.93), (7, 3, 0.1)] {
            let zeros = padding_for(win, size, target);
            assert!(win as f64 / (size + zeros) as f64 <= target);
            if zeros > 0 {
                assert!(win as f64 / (size + zeros - 1) as f64 > target);
            }
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(generator(0.98, 0, 1).generate().is_err());
        assert!(generator(-1.0, 256, 1).generate().is_err());
    }

    #[test]
    fn test_overflowing_paytable_fails_task() {
        let paytable = Arc::new(PayTable::new(vec![0, u64::MAX / 2 + 1]).unwrap());
        for (bound, seed) in [(1, 0), (256, 3), (256, 4)] {
            // two copies overflow the sum, one copy needs more padding than a reel may hold
            let generator =
                ReelCandidateGenerator::new(0.98, bound, Arc::clone(&paytable), ChaCha8Rng::seed_from_u64(seed));
            assert!(matches!(generator.generate(), Err(RfError::Generation(_))));
        }
    }

    #[test]
    fn test_padding_capped() {
        let paytable = Arc::new(PayTable::new(vec![0, MAX_REEL_SIZE as u64]).unwrap());
        let generator = ReelCandidateGenerator::new(0.5, 1, paytable, ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(generator.generate(), Err(RfError::Generation(_))));
    }

    #[test]
    fn test_into_reel() {
        let result = generator(0.98, 16, 8).generate().unwrap();
        let bytes = result.reel_bytes.clone();
        assert_eq!(result.into_reel().unwrap().as_bytes(), bytes.as_slice());

        let empty = GeneratedResult {
            rtp: 0.0,
            reel_bytes: Vec::new(),
        };
        assert!(empty.into_reel().is_err());
    }

    #[test]
    fn test_factory_is_reproducible() {
        let config = OptimizerConfig::quick();
        let mut a = NestedBoundsFactory::with_seed(&config, 11);
        let mut b = NestedBoundsFactory::with_seed(&config, 11);
        for run in 0..5 {
            assert_eq!(a.create(run).generate().unwrap(), b.create(run).generate().unwrap());
        }
        assert_eq!(a.master_seed(), 11);
    }
}
