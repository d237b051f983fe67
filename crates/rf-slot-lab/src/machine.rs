//! Single-reel slot machine
//!
//! Spins a [`VirtualReel`] at a uniformly random stop and pays
//! `multiplier × bet`. Used to check a reel's empirical RTP against its
//! theoretical value.

use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult, SeedSequence};

use crate::paytable::PayTable;
use crate::reel::VirtualReel;
use crate::symbols::Symbol;

/// Result of one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Stop position on the reel
    pub position: usize,
    pub symbol: Symbol,
    pub bet: u64,
    pub win: u64,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.win > 0
    }
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_bet: u64,
    pub total_win: u64,
    pub wins: u64,
    pub losses: u64,
    pub max_win: u64,
}

impl SessionStats {
    /// Empirical RTP (win / bet)
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0 {
            self.total_win as f64 / self.total_bet as f64
        } else {
            0.0
        }
    }

    /// Fraction of spins that paid
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            self.wins as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    /// Add one spin to the totals; on overflow the stats are left untouched
    fn record(&mut self, outcome: &SpinOutcome) -> RfResult<()> {
        let total_bet = self.total_bet.checked_add(outcome.bet).ok_or_else(|| {
            RfError::invalid_param(format!("session bet total overflows after {} spins", self.total_spins))
        })?;
        let total_win = self.total_win.checked_add(outcome.win).ok_or_else(|| {
            RfError::invalid_param(format!("session win total overflows after {} spins", self.total_spins))
        })?;

        self.total_spins += 1;
        self.total_bet = total_bet;
        self.total_win = total_win;
        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.max_win = self.max_win.max(outcome.win);
        Ok(())
    }
}

/// Reel plus paytable plus RNG
#[derive(Debug, Clone)]
pub struct ReelMachine {
    reel: VirtualReel,
    paytable: Arc<PayTable>,
    rng: ChaCha8Rng,
    stats: SessionStats,
}

impl ReelMachine {
    /// Seeded when `seed` is set, from entropy otherwise
    pub fn new(reel: VirtualReel, paytable: Arc<PayTable>, seed: Option<u64>) -> Self {
        Self {
            reel,
            paytable,
            rng: SeedSequence::from_option(seed).next_rng(),
            stats: SessionStats::default(),
        }
    }

    pub fn reel(&self) -> &VirtualReel {
        &self.reel
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// RTP if every stop position is equally likely
    pub fn theoretical_rtp(&self) -> RfResult<f64> {
        self.paytable.rtp_of(self.reel.as_bytes())
    }

    /// Spin once at `bet` credits
    pub fn spin(&mut self, bet: u64) -> RfResult<SpinOutcome> {
        if bet == 0 {
            return Err(RfError::invalid_param("bet must be > 0"));
        }

        let position = self.rng.random_range(0..self.reel.size());
        let symbol = self.reel.get(position as i64);
        let win = self
            .paytable
            .try_payout(symbol)?
            .checked_mul(bet)
            .ok_or_else(|| RfError::invalid_param(format!("win overflows for bet {bet}")))?;

        let outcome = SpinOutcome {
            position,
            symbol,
            bet,
            win,
        };
        self.stats.record(&outcome)?;
        Ok(outcome)
    }

    /// Spin `spins` times and return the session totals
    pub fn simulate(&mut self, spins: u64, bet: u64) -> RfResult<&SessionStats> {
        for _ in 0..spins {
            self.spin(bet)?;
        }
        log::debug!(
            "Simulated {spins} spins: rtp={:.4}, hit_rate={:.4}",
            self.stats.rtp(),
            self.stats.hit_rate()
        );
        Ok(&self.stats)
    }
}
