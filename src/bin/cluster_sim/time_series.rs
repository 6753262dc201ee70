// Per-step JSONL time series recorder
// One JSON line per step for independent analysis

use cluster_world::StepResult;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct StepSnapshot {
    pub step: u64,
    pub graph_count: usize,
    pub largest_cluster: usize,
    pub singletons: usize,
    pub removed: usize,
    pub reformed: usize,
    pub merges: usize,
    pub splits: usize,
}

impl StepSnapshot {
    pub fn from_result(result: &StepResult) -> Self {
        Self {
            step: result.step,
            graph_count: result.report.graph_count,
            largest_cluster: result.cluster_sizes.iter().copied().max().unwrap_or(0),
            singletons: result.cluster_sizes.iter().filter(|&&s| s == 1).count(),
            removed: result.report.removed,
            reformed: result.report.reformed_in_place + result.report.reformed_across,
            merges: result.report.merges,
            splits: result.report.splits,
        }
    }
}

/// Accumulates snapshots and writes them as JSONL.
pub struct TimeSeriesRecorder {
    snapshots: Vec<StepSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, result: &StepResult) {
        self.snapshots.push(StepSnapshot::from_result(result));
    }

    /// One snapshot per line to `out`.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for snapshot in &self.snapshots {
            serde_json::to_writer(&mut out, snapshot)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }

    pub fn write_jsonl(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write_to(BufWriter::new(File::create(path)?))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_world::{ClusterSimulation, SimulationConfig};
    use cluster_world::structure::parse_structure;

    #[test]
    fn test_write_to_emits_one_line_per_step() {
        let records = parse_structure("a b 1 0\nb c 0 0\n").unwrap();
        let config = SimulationConfig { update_break_probabilities: false, ..Default::default() };
        let mut sim = ClusterSimulation::from_records(&records, &config).unwrap();
        let mut recorder = TimeSeriesRecorder::new();
        for _ in 0..3 {
            recorder.record(&sim.step_core().unwrap());
        }

        let mut out = Vec::new();
        recorder.write_to(&mut out).unwrap();
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["step"], 1);
        assert_eq!(lines[0]["removed"], 1);
        assert_eq!(lines[0]["singletons"], 1);
    }
}
