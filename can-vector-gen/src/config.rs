//! Generator configuration types
//!
//! This module defines the knobs of a catalogue sweep: the random seed, how
//! many frames to build per signal, and which messages to cover.

use serde::{Deserialize, Serialize};

/// Configuration for a test-vector sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Seed for the sweep's random source
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Frames to build per signal (values below 1 are treated as 1)
    #[serde(default = "default_iters_per_signal")]
    pub iters_per_signal: usize,

    /// Stop after this many signals (0 = no limit)
    #[serde(default)]
    pub max_signals: usize,

    /// Optional: only cover these CAN message IDs
    #[serde(default)]
    pub can_ids: Option<Vec<u32>>,
}

fn default_seed() -> u64 {
    12345
}

fn default_iters_per_signal() -> usize {
    1
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            iters_per_signal: default_iters_per_signal(),
            max_signals: 0,
            can_ids: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method: set frames per signal
    pub fn with_iters_per_signal(mut self, iters: usize) -> Self {
        self.iters_per_signal = iters;
        self
    }

    /// Builder method: limit the number of signals covered
    pub fn with_max_signals(mut self, max_signals: usize) -> Self {
        self.max_signals = max_signals;
        self
    }

    /// Builder method: restrict the sweep to these CAN IDs
    pub fn with_can_ids(mut self, can_ids: Vec<u32>) -> Self {
        self.can_ids = Some(can_ids);
        self
    }

    /// Check if a message ID should be covered
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.can_ids {
            Some(ids) => ids.contains(&can_id),
            None => true,
        }
    }

    /// Effective number of frames per signal
    pub fn iterations(&self) -> usize {
        self.iters_per_signal.max(1)
    }

    /// True once `tested` signals reach the configured limit
    pub fn signal_limit_reached(&self, tested: usize) -> bool {
        self.max_signals > 0 && tested >= self.max_signals
    }
}
