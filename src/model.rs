// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Break Probability Model

use serde::{Deserialize, Serialize};

/// Maps the size of the group that would leave if a bond broke to that
/// bond's break probability.
pub trait BreakProbabilityModel {
    fn break_probability(&self, leaving_group_size: usize) -> f64;
}

impl<F> BreakProbabilityModel for F
where
    F: Fn(usize) -> f64,
{
    fn break_probability(&self, leaving_group_size: usize) -> f64 {
        self(leaving_group_size)
    }
}

/// Default base probability a lone cluster detaches with.
pub const DEFAULT_BASE_BREAK_PROBABILITY: f64 = 0.5;

/// Per-member damping applied to the base probability.
pub const DEFAULT_LEAVING_GROUP_DECAY: f64 = 1.1;

/// `p(k) = base / decay^k`: larger departing groups detach less readily.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeavingGroupModel {
    pub base_break_probability: f64,
    pub decay: f64,
}

impl LeavingGroupModel {
    pub fn new(base_break_probability: f64) -> Self {
        Self { base_break_probability, decay: DEFAULT_LEAVING_GROUP_DECAY }
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }
}

impl Default for LeavingGroupModel {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_BREAK_PROBABILITY)
    }
}

impl BreakProbabilityModel for LeavingGroupModel {
    fn break_probability(&self, leaving_group_size: usize) -> f64 {
        self.base_break_probability / self.decay.powf(leaving_group_size as f64)
    }
}
