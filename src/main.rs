use anyhow::{Context, Result};
use clap::Parser;

use std::path::PathBuf;

use wave_scan::detect::DetectParams;

#[derive(Debug, Parser)]
struct Args {
    /// Path to the CSV file (unix,open,high,low,close)
    #[arg(long)]
    input: PathBuf,

    /// Minimum separation between local minima (candles)
    #[arg(long, default_value_t = 1)]
    minima_distance: usize,

    /// Pops needed in a single row to wipe the low chain
    #[arg(long, default_value_t = 3)]
    reset_threshold: usize,

    /// First-leg retracement band (e.g. 0.618)
    #[arg(long, default_value_t = 0.618)]
    retracement_ratio: f64,

    /// Post-breakout retracement ratio for the forward scan (e.g. 0.382)
    #[arg(long, default_value_t = 0.382)]
    high2_retracement_ratio: f64,

    /// Write resolved outcomes to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let candles = wave_scan::data::get_candles_from_input_file(&args.input)
        .with_context(|| format!("failed to load candles from {:?}", args.input))?;
    if candles.is_empty() {
        println!("No data found in CSV.");
        return Ok(());
    }

    println!("Loaded {} candles.", candles.len());

    let params = DetectParams {
        minima_distance: args.minima_distance,
        reset_threshold: args.reset_threshold,
        retracement_ratio: args.retracement_ratio,
        high2_retracement_ratio: args.high2_retracement_ratio,
    };

    let report = wave_scan::detect_waves(&candles, &params)?;

    wave_scan::output::print_summary(&report);

    if let Some(output) = &args.output {
        wave_scan::output::write_outcomes_csv(&report, output)?;
        println!("Wrote {} outcomes to {:?}", report.resolved_count(), output);
    }

    Ok(())
}
