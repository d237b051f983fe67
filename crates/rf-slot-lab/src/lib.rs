//! # rf-slot-lab: Reel Generation & Optimization Engine
//!
//! Searches for a virtual reel (a symbol-frequency table) whose theoretical
//! RTP is as close as possible to a target without exceeding it, preferring
//! smaller reels at equal RTP.
//!
//! ## Features
//!
//! - **PayTable**: symbol → payout multiplier, validated on load
//! - **VirtualReel / ReelBuilder**: wraparound reels with a gzip+base64 string form
//! - **Nested-bounds generator**: one candidate reel per task, padded under the ceiling
//! - **Optimizer**: producer/consumer over a bounded queue and a rayon worker pool
//! - **Stop conditions**: wall-clock or run-count budgets
//! - **ReelMachine**: spin simulator for empirical RTP checks
//!
//! ## Architecture
//!
//! ```text
//! ReelOptimizer
//!     │
//!     ├── OptimizerConfig (history, target, queue, workers, seed)
//!     ├── StopCondition (TimeBound | CountBound)
//!     └── GeneratorFactory ──► ReelCandidateGenerator
//!                                   │
//!                                   ├── ReelBuilder
//!                                   └── PayTable
//!                                   │
//!                                   v
//!                           GeneratedResult → VirtualReel → on_new_best
//! ```

pub mod codec;
pub mod config;
pub mod generator;
pub mod machine;
pub mod optimizer;
pub mod paytable;
pub mod reel;
pub mod stop;
pub mod symbols;

pub use codec::*;
pub use config::*;
pub use generator::*;
pub use machine::*;
pub use optimizer::*;
pub use paytable::*;
pub use reel::*;
pub use stop::*;
pub use symbols::*;
