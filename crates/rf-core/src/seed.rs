//! Deterministic seed sequencing
//!
//! A single master seed fans out into one independent seed per task, so
//! concurrent workers never share an RNG and a run can be replayed from the
//! master seed alone.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces per-task seeds from a master seed
#[derive(Debug, Clone)]
pub struct SeedSequence {
    master: u64,
    rng: ChaCha8Rng,
    issued: u64,
}

impl SeedSequence {
    /// Create a sequence from a fixed master seed
    pub fn new(master: u64) -> Self {
        Self {
            master,
            rng: ChaCha8Rng::seed_from_u64(master),
            issued: 0,
        }
    }

    /// Create a sequence from OS entropy
    ///
    /// The drawn master seed is logged so the run can be reproduced.
    pub fn from_entropy() -> Self {
        let master = rand::rng().random::<u64>();
        log::info!("Seed sequence initialised from entropy (master seed {master})");
        Self::new(master)
    }

    /// Create from an optional seed, falling back to entropy
    pub fn from_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    /// Master seed this sequence was built from
    pub fn master(&self) -> u64 {
        self.master
    }

    /// Number of seeds handed out so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Next per-task seed
    pub fn next_seed(&mut self) -> u64 {
        self.issued += 1;
        self.rng.random::<u64>()
    }

    /// Next per-task RNG
    pub fn next_rng(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.next_seed())
    }
}
