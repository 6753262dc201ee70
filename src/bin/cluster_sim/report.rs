// Monte Carlo report types
// Structured output for downstream histogramming and analysis

use cluster_world::SizeHistogram;
use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    /// Sample mean, sample standard deviation and normal 95% interval,
    /// accumulated in one pass (Welford).
    pub fn from_samples<I: IntoIterator<Item = f64>>(samples: I) -> Self {
        let mut n = 0usize;
        let (mut mean, mut m2) = (0.0, 0.0);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for x in samples {
            n += 1;
            let delta = x - mean;
            mean += delta / n as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }
        if n == 0 {
            return Self::default();
        }

        let std_dev = if n > 1 { (m2 / (n - 1) as f64).sqrt() } else { 0.0 };
        let half_width = Z_95 * std_dev / (n as f64).sqrt();
        Self { mean, std_dev, ci_lower: mean - half_width, ci_upper: mean + half_width, min, max, n }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub steps: u64,
    pub graph_count: usize,
    pub mean_cluster_size: f64,
    pub largest_cluster: usize,
    pub total_removed: u64,
    pub total_reformed: u64,
    pub total_merges: u64,
    pub total_splits: u64,
    pub cluster_sizes: Vec<usize>,
    pub histogram: SizeHistogram,
    pub elapsed_ms: u128,
}

// ─── Monte Carlo Report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub n_runs: usize,
    pub base_seed: u64,
    pub steps: u64,
    pub update_break_probabilities: bool,
    pub graph_count: Stats,
    pub mean_cluster_size: Stats,
    pub largest_cluster: Stats,
    pub elapsed_ms: Stats,
    /// Final cluster sizes of every run pooled together.
    pub pooled_histogram: SizeHistogram,
    pub individual_runs: Vec<RunResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SimReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub structure: String,
    pub cluster_count: usize,
    pub bond_count: usize,
    pub monte_carlo: MonteCarloReport,
}
