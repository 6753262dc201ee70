// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation Engine

pub mod types;
pub mod error;
pub mod model;
pub mod graph;
pub mod population;
pub mod simulation;
pub mod config;
pub mod structure;
pub mod histogram;

pub use config::SimulationConfig;
pub use error::{EngineError, EngineResult};
pub use graph::Graph;
pub use histogram::SizeHistogram;
pub use model::{BreakProbabilityModel, LeavingGroupModel};
pub use population::{Population, StepReport};
pub use simulation::{ClusterSimulation, SimulationSummary, StepResult};
pub use types::*;

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl ClusterSimulation {
    /// Load a bond list and seed the run.
    #[wasm_bindgen(constructor)]
    pub fn from_structure_text(
        structure: &str,
        seed: u64,
        update_break_probabilities: bool,
    ) -> Result<ClusterSimulation, JsError> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let records = structure::parse_structure(structure)?;
        let config = SimulationConfig {
            seed,
            update_break_probabilities,
            ..SimulationConfig::default()
        };
        Ok(ClusterSimulation::from_records(&records, &config)?)
    }

    pub fn step(&mut self) -> Result<JsValue, JsError> {
        let result = self.step_core()?;
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    /// Run N steps without returning per-step results.
    pub fn run_batch(&mut self, steps: u32) -> Result<(), JsError> {
        self.run(u64::from(steps))?;
        Ok(())
    }

    pub fn get_cluster_sizes(&self) -> Vec<u32> {
        self.cluster_sizes()
            .into_iter()
            .map(|size| u32::try_from(size).unwrap_or(u32::MAX))
            .collect()
    }

    pub fn get_histogram(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.histogram()).unwrap_or(JsValue::NULL)
    }

    pub fn get_summary(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.summary()).unwrap_or(JsValue::NULL)
    }

    pub fn get_step(&self) -> u64 {
        self.current_step()
    }

    pub fn set_refresh(&mut self, update: bool) {
        self.set_update_break_probabilities(update);
    }
}
