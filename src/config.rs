// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Run Configuration

use serde::{Deserialize, Serialize};

use crate::model::{LeavingGroupModel, DEFAULT_BASE_BREAK_PROBABILITY, DEFAULT_LEAVING_GROUP_DECAY};

/// Seed used when none is given, matching the reference runs.
pub const DEFAULT_SEED: u64 = 6;

/// Reform probability assigned by the layered structure generator.
pub const DEFAULT_REFORM_PROBABILITY: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("step count must be positive")]
    InvalidSteps,
    #[error("`{name}` must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("leaving group decay must be at least 1, got {0}")]
    InvalidDecay(f64),
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of steps to run.
    pub steps: u64,
    /// Refresh break probabilities from the leaving-group model every step.
    /// When off, bonds keep whatever probability they last had.
    pub update_break_probabilities: bool,
    pub seed: u64,
    pub base_break_probability: f64,
    pub leaving_group_decay: f64,
    /// Only used when a structure is generated rather than loaded.
    pub default_reform_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            update_break_probabilities: true,
            seed: DEFAULT_SEED,
            base_break_probability: DEFAULT_BASE_BREAK_PROBABILITY,
            leaving_group_decay: DEFAULT_LEAVING_GROUP_DECAY,
            default_reform_probability: DEFAULT_REFORM_PROBABILITY,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps == 0 {
            return Err(ConfigError::InvalidSteps);
        }
        check_probability("base_break_probability", self.base_break_probability)?;
        check_probability("default_reform_probability", self.default_reform_probability)?;
        if !(self.leaving_group_decay >= 1.0) {
            return Err(ConfigError::InvalidDecay(self.leaving_group_decay));
        }
        Ok(())
    }

    pub fn model(&self) -> LeavingGroupModel {
        LeavingGroupModel::new(self.base_break_probability).with_decay(self.leaving_group_decay)
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}
