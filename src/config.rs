//! Training configuration
//!
//! Everything the caller decides: network shape, rates, batch size, and when
//! to give up. Stored as JSON.

use crate::error::{ParliamentError, Result};
use crate::learning::Seeding;
use crate::network::validate_sizes;
use crate::schedule::ScheduleConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trainer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Layer widths, input first and output last
    pub sizes: Vec<usize>,
    /// Base update rate (must be positive)
    pub rate: f64,
    /// Background rate schedule
    pub schedule: ScheduleConfig,
    /// How updates seed cells with nothing to nudge with
    pub seeding: Seeding,
    /// Samples per training step
    pub batch_size: usize,
    /// Stop once more than this many consecutive steps report zero activity
    pub stall_threshold: usize,
    /// Upper bound on samples drawn over the whole run
    pub max_samples: usize,
    /// Start from random weights instead of all zeros
    pub randomize: bool,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            sizes: vec![784, 128, 10],
            rate: 5.0,
            schedule: ScheduleConfig::default(),
            seeding: Seeding::default(),
            batch_size: 201,
            stall_threshold: 10,
            max_samples: 60000 * 30,
            randomize: true,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Config for a given shape, defaults elsewhere
    pub fn with_sizes(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            ..Default::default()
        }
    }

    /// Reject shapes and rates the trainer cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_sizes(&self.sizes)?;
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ParliamentError::InvalidConfig(format!(
                "rate must be positive, got {}",
                self.rate
            )));
        }
        if self.batch_size == 0 {
            return Err(ParliamentError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.schedule.initial() < 0.0 {
            return Err(ParliamentError::InvalidConfig(format!(
                "initial background rate must be non-negative, got {}",
                self.schedule.initial()
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON config
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }
}
