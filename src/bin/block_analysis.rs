use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Deserialize;

use wave_scan::data::get_candles_from_input_file;
use wave_scan::detect::{DetectParams, WaveReport, detect_waves};
use wave_scan::output::{append_outcomes_ndjson, print_summary};
use wave_scan::sampling::sample_blocks;

/// Stratified block sampling over a long series, then one independent
/// detection run per sampled block (in parallel) with the merged
/// outcome sets reported at the end.
#[derive(Debug, Parser)]
struct Args {
    /// config-file path
    #[arg(long)]
    config: PathBuf,
}

#[derive(Deserialize)]
struct Config {
    /// Path to the CSV file (unix,open,high,low,close)
    input: PathBuf,

    /// How many contiguous blocks to cut the series into (>= 3)
    number_of_splits: usize,

    /// RNG seed for reproducible sampling; omit for a random run
    seed: Option<u64>,

    /// Minimum separation between local minima (candles)
    minima_distance: usize,

    /// Pops needed in a single row to wipe the low chain
    reset_threshold: usize,

    /// First-leg retracement band (e.g. 0.618)
    retracement_ratio: f64,

    /// Post-breakout retracement ratio for the forward scan (e.g. 0.382)
    high2_retracement_ratio: f64,

    /// Append merged outcomes to this NDJSON file
    ndjson_output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args
        .config
        .into_os_string()
        .into_string()
        .expect("Failed to translate config file path into string");
    let config: Config = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()?
        .try_deserialize()?;

    let candles = get_candles_from_input_file(&config.input)
        .with_context(|| format!("failed to load candles from {:?}", config.input))?;

    if candles.is_empty() {
        println!("No data found in CSV.");
        return Ok(());
    }

    println!("Loaded {} candles.", candles.len());

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let blocks = sample_blocks(&candles, config.number_of_splits, &mut rng)?;
    let ids: Vec<usize> = blocks.iter().map(|b| b.id).collect();
    println!(
        "Sampled {} of {} blocks: {:?}",
        blocks.len(),
        config.number_of_splits,
        ids
    );

    let params = DetectParams {
        minima_distance: config.minima_distance,
        reset_threshold: config.reset_threshold,
        retracement_ratio: config.retracement_ratio,
        high2_retracement_ratio: config.high2_retracement_ratio,
    };

    // Blocks share no mutable state, so each one runs its own full
    // pipeline pass on a worker.
    let reports: Vec<(usize, WaveReport)> = blocks
        .par_iter()
        .map(|block| {
            let report = detect_waves(block.slice(&candles), &params)?;
            Ok((block.id, report))
        })
        .collect::<Result<_, wave_scan::WaveError>>()?;

    println!();
    println!("block  green%  success  failure  unresolved");
    let mut merged = WaveReport::default();
    for (id, report) in reports {
        let block = blocks
            .iter()
            .find(|b| b.id == id)
            .expect("report id comes from blocks");
        println!(
            "{:>5} {:>6.1} {:>8} {:>8} {:>11}",
            id,
            block.green_ratio * 100.0,
            report.successes.len(),
            report.failures.len(),
            report.unresolved.len()
        );
        merged.merge(report);
    }

    println!();
    print_summary(&merged);

    if let Some(path) = &config.ndjson_output {
        append_outcomes_ndjson(&merged, path)?;
        println!("Appended {} outcomes to {:?}", merged.resolved_count(), path);
    }

    Ok(())
}
