//! rf-core: Shared types and utilities for ReelForge
//!
//! This crate provides the foundational pieces used across the ReelForge
//! reel-engine crates: the common error type and deterministic seeding.

mod error;
mod seed;

pub use error::*;
pub use seed::*;
