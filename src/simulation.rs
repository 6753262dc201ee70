// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Simulation Core

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wasm_bindgen::prelude::*;

use crate::config::SimulationConfig;
use crate::error::EngineResult;
use crate::histogram::SizeHistogram;
use crate::model::BreakProbabilityModel;
use crate::population::{Population, StepReport};
use crate::types::BondRecord;

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u64,
    pub report: StepReport,
    pub cluster_sizes: Vec<usize>,
}

/// Running totals over all steps taken so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTotals {
    pub removed: u64,
    pub reformed: u64,
    pub merges: u64,
    pub splits: u64,
}

impl StepTotals {
    fn record(&mut self, report: &StepReport) {
        self.removed += report.removed as u64;
        self.reformed += (report.reformed_in_place + report.reformed_across) as u64;
        self.merges += report.merges as u64;
        self.splits += report.splits as u64;
    }
}

/// State of the population after a batch of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub steps: u64,
    pub graph_count: usize,
    pub cluster_sizes: Vec<usize>,
    pub histogram: SizeHistogram,
    pub totals: StepTotals,
}

// ─── ClusterSimulation ───────────────────────────────────────────────────────

#[wasm_bindgen]
pub struct ClusterSimulation {
    pub(crate) population: Population,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) model: Box<dyn BreakProbabilityModel>,
    pub(crate) update_break_probabilities: bool,
    pub(crate) current_step: u64,
    pub(crate) totals: StepTotals,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl ClusterSimulation {
    /// Driver over an existing population using the config's leaving-group
    /// model and seed.
    pub fn new(population: Population, config: &SimulationConfig) -> Self {
        Self {
            population,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            model: Box::new(config.model()),
            update_break_probabilities: config.update_break_probabilities,
            current_step: 0,
            totals: StepTotals::default(),
        }
    }

    pub fn from_records(records: &[BondRecord], config: &SimulationConfig) -> EngineResult<Self> {
        let population = Population::from_records(records)?;
        info!(
            graphs = population.graph_count(),
            clusters = population.node_count(),
            seed = config.seed,
            "loaded structure"
        );
        Ok(Self::new(population, config))
    }

    /// Swap the break probability model.
    pub fn with_model(mut self, model: Box<dyn BreakProbabilityModel>) -> Self {
        self.model = model;
        self
    }

    pub fn step_core(&mut self) -> EngineResult<StepResult> {
        let report = self
            .population
            .step(&mut self.rng, self.model.as_ref(), self.update_break_probabilities)?;
        self.current_step += 1;
        self.totals.record(&report);

        debug!(
            step = self.current_step,
            removed = report.removed,
            reformed = report.reformed_in_place + report.reformed_across,
            merges = report.merges,
            splits = report.splits,
            graphs = report.graph_count,
            "step complete"
        );

        Ok(StepResult {
            step: self.current_step,
            report,
            cluster_sizes: self.population.cluster_sizes(),
        })
    }

    /// Run `steps` steps, stopping at the first invariant violation.
    pub fn run(&mut self, steps: u64) -> EngineResult<SimulationSummary> {
        for _ in 0..steps {
            self.step_core()?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> SimulationSummary {
        let cluster_sizes = self.population.cluster_sizes();
        SimulationSummary {
            steps: self.current_step,
            graph_count: cluster_sizes.len(),
            histogram: SizeHistogram::from_sizes(&cluster_sizes),
            cluster_sizes,
            totals: self.totals.clone(),
        }
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.population.cluster_sizes()
    }

    pub fn histogram(&self) -> SizeHistogram {
        SizeHistogram::from_sizes(&self.population.cluster_sizes())
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn totals(&self) -> &StepTotals {
        &self.totals
    }

    pub fn set_update_break_probabilities(&mut self, update: bool) {
        self.update_break_probabilities = update;
    }
}
