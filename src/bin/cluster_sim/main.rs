// Cluster World Simulation Runner
// Monte Carlo over seeds, seedable ChaCha8 PRNG, per-step JSONL time series
//
// Usage:
//   cargo run --release --bin cluster-sim                               # Layered 10x3 structure, 100 steps
//   cargo run --release --bin cluster-sim -- --structure structure.txt  # Load a bond list
//   cargo run --release --bin cluster-sim -- --runs 30 --seed 42        # 30 runs from seed 42
//   cargo run --release --bin cluster-sim -- --no-update                # Keep loaded break probabilities
//   cargo run --release --bin cluster-sim -- --time-series              # Enable JSONL output
//   cargo run --release --bin cluster-sim -- --write-structure s.txt    # Save the structure used

mod logging;
mod monte_carlo;
mod report;
mod time_series;

use anyhow::{Context, bail};
use clap::Parser;
use cluster_world::structure::{layered_structure, parse_structure, render_structure};
use cluster_world::{BondRecord, Population, SimulationConfig};
use report::*;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "cluster-sim", version, about = "Stochastic cluster bond break/reform simulation")]
struct Cli {
    /// Bond list file: `source dest break_probability reform_probability` per line.
    #[arg(long)]
    structure: Option<PathBuf>,

    /// JSON run configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layers of the generated structure when no file is given.
    #[arg(long, default_value_t = 10)]
    layers: u32,

    /// Children per layer parent of the generated structure.
    #[arg(long, default_value_t = 3)]
    breadth: u32,

    #[arg(long)]
    steps: Option<u64>,

    /// Seed of the first run; run i uses seed + i.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Keep break probabilities at their loaded values.
    #[arg(long)]
    no_update: bool,

    /// Write per-step JSONL snapshots for every run.
    #[arg(long)]
    time_series: bool,

    #[arg(long, default_value = "cluster-results")]
    output_dir: PathBuf,

    /// Save the loaded or generated structure as a bond list file.
    #[arg(long)]
    write_structure: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimulationConfig::from_json_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(steps) = cli.steps {
        config.steps = steps;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.no_update {
        config.update_break_probabilities = false;
    }
    config.validate()?;
    Ok(config)
}

fn load_structure(cli: &Cli, config: &SimulationConfig) -> anyhow::Result<(String, Vec<BondRecord>)> {
    match &cli.structure {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading structure {}", path.display()))?;
            let records = parse_structure(&raw)
                .with_context(|| format!("parsing structure {}", path.display()))?;
            Ok((path.display().to_string(), records))
        }
        None => Ok((
            format!("layered {}x{}", cli.layers, cli.breadth),
            layered_structure(
                cli.layers,
                cli.breadth,
                config.base_break_probability,
                config.default_reform_probability,
            ),
        )),
    }
}

fn write_structure(path: &Path, records: &[BondRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, render_structure(records))
        .with_context(|| format!("writing structure {}", path.display()))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }
    let config = load_config(&cli)?;
    let (structure_name, records) = load_structure(&cli, &config)?;
    if records.is_empty() {
        bail!("structure `{}` contains no bonds", structure_name);
    }
    let initial = Population::from_records(&records).context("loading initial structure")?;
    if let Some(path) = &cli.write_structure {
        write_structure(path, &records)?;
        tracing::info!(path = %path.display(), bonds = records.len(), "structure written");
    }

    let ts_dir = cli.time_series.then(|| cli.output_dir.join("time-series"));

    println!("\n  Cluster World Simulation Runner");
    println!("  PRNG: ChaCha8Rng | Runs: {} | Base seed: {} | Steps: {} | Refresh: {}",
        cli.runs, config.seed, config.steps, config.update_break_probabilities);
    println!("  Structure: {} ({} clusters, {} bonds, {} initial graphs)\n",
        structure_name, initial.node_count(), records.len(), initial.graph_count());

    let suite_start = Instant::now();
    let mc = monte_carlo::run_monte_carlo(&records, &config, cli.runs, ts_dir.as_deref())?;

    println!("  {:<8} {:>8} {:>10} {:>9} {:>9} {:>9} {:>7}",
        "Seed", "Graphs", "MeanSize", "Largest", "Removed", "Reformed", "Time");
    println!("  {}", "-".repeat(66));
    for run in &mc.individual_runs {
        println!("  {:<8} {:>8} {:>10.2} {:>9} {:>9} {:>9} {:>5}ms",
            run.seed, run.graph_count, run.mean_cluster_size, run.largest_cluster,
            run.total_removed, run.total_reformed, run.elapsed_ms);
    }
    println!("  {}", "-".repeat(66));
    println!("  Graphs: {:.2} ± {:.2}   Mean size: {:.2} ± {:.2}   Suite time: {:.1}s\n",
        mc.graph_count.mean,
        (mc.graph_count.ci_upper - mc.graph_count.ci_lower) / 2.0,
        mc.mean_cluster_size.mean,
        (mc.mean_cluster_size.ci_upper - mc.mean_cluster_size.ci_lower) / 2.0,
        suite_start.elapsed().as_secs_f64());

    println!("  Cluster size histogram (pooled):");
    for bin in &mc.pooled_histogram.bins {
        println!("    {:>4} | {:>6}", bin.size, bin.count);
    }

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let timestamp = format!("{}", ts);

    let report = SimReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        structure: structure_name,
        cluster_count: initial.node_count(),
        bond_count: records.len(),
        monte_carlo: mc,
    };

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;
    let path = cli.output_dir.join(format!("run-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
    println!("\n  Results saved to: {}\n", path.display());

    Ok(())
}
