// Monte Carlo infrastructure: N runs over consecutive seeds with statistical
// aggregation of the final cluster population.

use anyhow::Context;
use cluster_world::{BondRecord, ClusterSimulation, EngineError, SimulationConfig, SizeHistogram};
use tracing::{error, info};

use crate::report::*;
use crate::time_series::TimeSeriesRecorder;

use std::time::Instant;

/// Context line for a run stopped by an engine error.
fn abort_context(seed: u64, step: u64, err: &EngineError) -> String {
    format!("seed {} aborted at step {}: {} violated", seed, step, err.kind())
}

/// Run one simulation with a specific seed.
pub fn run_single(
    records: &[BondRecord],
    config: &SimulationConfig,
    seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> anyhow::Result<RunResult> {
    let start = Instant::now();
    let run_config = SimulationConfig { seed, ..config.clone() };
    let mut sim = ClusterSimulation::from_records(records, &run_config)
        .with_context(|| format!("loading structure for seed {}", seed))?;

    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());
    for _ in 0..config.steps {
        let result = match sim.step_core() {
            Ok(result) => result,
            Err(err) => {
                let step = sim.current_step() + 1;
                error!(seed, step, kind = err.kind(), "run aborted");
                let context = abort_context(seed, step, &err);
                return Err(anyhow::Error::new(err).context(context));
            }
        };
        if let Some(ref mut ts) = time_series {
            ts.record(&result);
        }
    }

    if let (Some(dir), Some(ts)) = (time_series_dir, &time_series) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        ts.write_jsonl(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), steps = ts.len(), "time series written");
    }

    let summary = sim.summary();
    let largest_cluster = summary.cluster_sizes.iter().copied().max().unwrap_or(0);
    let mean_cluster_size = if summary.graph_count > 0 {
        summary.cluster_sizes.iter().sum::<usize>() as f64 / summary.graph_count as f64
    } else {
        0.0
    };

    Ok(RunResult {
        seed,
        steps: summary.steps,
        graph_count: summary.graph_count,
        mean_cluster_size,
        largest_cluster,
        total_removed: summary.totals.removed,
        total_reformed: summary.totals.reformed,
        total_merges: summary.totals.merges,
        total_splits: summary.totals.splits,
        cluster_sizes: summary.cluster_sizes,
        histogram: summary.histogram,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Run `n_runs` simulations with seeds `base_seed..base_seed + n_runs`.
pub fn run_monte_carlo(
    records: &[BondRecord],
    config: &SimulationConfig,
    n_runs: usize,
    time_series_dir: Option<&std::path::Path>,
) -> anyhow::Result<MonteCarloReport> {
    let mut runs = Vec::with_capacity(n_runs);
    for i in 0..n_runs as u64 {
        runs.push(run_single(records, config, config.seed.wrapping_add(i), time_series_dir)?);
    }

    let stats = |f: fn(&RunResult) -> f64| Stats::from_samples(runs.iter().map(f));
    let pooled: Vec<usize> = runs.iter().flat_map(|r| r.cluster_sizes.iter().copied()).collect();

    Ok(MonteCarloReport {
        n_runs,
        base_seed: config.seed,
        steps: config.steps,
        update_break_probabilities: config.update_break_probabilities,
        graph_count: stats(|r| r.graph_count as f64),
        mean_cluster_size: stats(|r| r.mean_cluster_size),
        largest_cluster: stats(|r| r.largest_cluster as f64),
        elapsed_ms: stats(|r| r.elapsed_ms as f64),
        pooled_histogram: SizeHistogram::from_sizes(&pooled),
        individual_runs: runs,
    })
}
