//! Optimizer configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use rf_core::{RfError, RfResult};

use crate::paytable::PayTable;

/// Settings for a [`ReelOptimizer`](crate::optimizer::ReelOptimizer) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Slots in the rolling acceptance history
    pub history_size: usize,

    /// RTP ceiling a candidate may reach but never exceed
    pub target_rtp: f64,

    /// Pending-task queue capacity per history slot
    pub queue_multiplier: usize,

    /// Generation worker threads (0 = one per CPU)
    pub worker_threads: usize,

    /// Width of each nested-bounds draw window
    pub symbol_window: u32,

    /// Master seed (None = OS entropy)
    pub seed: Option<u64>,

    /// Symbol payouts
    pub paytable: PayTable,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            history_size: 1024,
            target_rtp: 0.98,
            queue_multiplier: 60,
            worker_threads: 0,
            symbol_window: 256,
            seed: None,
            paytable: PayTable::standard(),
        }
    }
}

impl OptimizerConfig {
    /// Small, seeded configuration for tests and CI
    pub fn quick() -> Self {
        Self {
            history_size: 16,
            queue_multiplier: 4,
            worker_threads: 2,
            seed: Some(0x5EED),
            ..Default::default()
        }
    }

    /// Full-size search at 0.98
    pub fn production() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_target(mut self, target_rtp: f64) -> Self {
        self.target_rtp = target_rtp;
        self
    }

    pub fn with_history(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    /// Check construction-time invariants
    pub fn validate(&self) -> RfResult<()> {
        if self.history_size == 0 {
            return Err(RfError::invalid_param("history_size must be > 0"));
        }
        if !self.target_rtp.is_finite() || self.target_rtp <= 0.0 {
            return Err(RfError::invalid_param(format!(
                "target_rtp must be finite and > 0, got {}",
                self.target_rtp
            )));
        }
        if self.queue_multiplier == 0 {
            return Err(RfError::invalid_param("queue_multiplier must be > 0"));
        }
        if self.history_size.checked_mul(self.queue_multiplier).is_none() {
            return Err(RfError::invalid_param(format!(
                "queue capacity overflows: {} x {}",
                self.history_size, self.queue_multiplier
            )));
        }
        if self.symbol_window == 0 {
            return Err(RfError::invalid_param("symbol_window must be >= 1"));
        }
        Ok(())
    }

    /// Bounded queue capacity for pending tasks
    pub fn queue_capacity(&self) -> usize {
        self.history_size.saturating_mul(self.queue_multiplier)
    }

    /// Worker count with the per-CPU default resolved
    pub fn worker_count(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_threads
        }
    }

    pub fn from_json_str(json: &str) -> RfResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RfError::Config(format!("JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> RfResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| RfError::Config(format!("YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> RfResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Self::from_json_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Err(RfError::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> RfResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RfError::Config(format!("JSON: {e}")))
    }
}
