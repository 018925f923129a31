use anyhow::{Context, Result};
use serde::Serialize;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::detect::WaveReport;
use crate::outcome::{Verdict, WaveOutcome};

/// Flat result row, one per classified wave. Column layout follows the
/// reference study's result files (`high2 - high1` is the quantity its
/// aggregation averages).
#[derive(Debug, Serialize)]
struct OutcomeRecord {
    verdict: Verdict,
    low1_position: usize,
    low1_price: f64,
    high1_position: usize,
    high1_price: f64,
    low2_position: usize,
    low2_price: f64,
    high2_position: Option<usize>,
    high2_price: Option<f64>,
    exit_position: usize,
    exit_price: f64,
    peak_gain: Option<f64>,
}

impl From<&WaveOutcome> for OutcomeRecord {
    fn from(outcome: &WaveOutcome) -> Self {
        let c = &outcome.candidate;
        Self {
            verdict: outcome.verdict,
            low1_position: c.low1.position,
            low1_price: c.low1.price,
            high1_position: c.high1.position,
            high1_price: c.high1.price,
            low2_position: c.low2.position,
            low2_price: c.low2.price,
            high2_position: outcome.high2.map(|h| h.position),
            high2_price: outcome.high2.map(|h| h.price),
            exit_position: outcome.exit.position,
            exit_price: outcome.exit.price,
            peak_gain: outcome.peak_gain(),
        }
    }
}

/// Write all resolved outcomes of a report as CSV.
pub fn write_outcomes_csv(report: &WaveReport, path: &PathBuf) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create output file: {path:?}"))?;
    let mut wtr = csv::Writer::from_writer(file);

    for outcome in report.successes.iter().chain(report.failures.iter()) {
        wtr.serialize(OutcomeRecord::from(outcome))
            .with_context(|| "failed to serialize outcome row")?;
    }

    wtr.flush()
        .with_context(|| format!("failed to flush output file: {path:?}"))?;
    Ok(())
}

/// Append outcomes as NDJSON, one object per line.
pub fn append_outcomes_ndjson(report: &WaveReport, path: &PathBuf) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open ndjson file: {path:?}"))?;

    for outcome in report.successes.iter().chain(report.failures.iter()) {
        let line = serde_json::to_string(&OutcomeRecord::from(outcome))?;
        writeln!(f, "{line}")?;
    }
    Ok(())
}

/// Simple CLI-style summary reusable from any binary.
pub fn print_summary(report: &WaveReport) {
    println!("=== Wave Detection Summary ===");
    println!("Successes:   {}", report.successes.len());
    println!("Failures:    {}", report.failures.len());
    println!("Unresolved:  {}", report.unresolved.len());
    match report.success_ratio() {
        Some(ratio) => println!("Success ratio: {:.2}%", ratio * 100.0),
        None => println!("Success ratio: n/a (nothing resolved)"),
    }
    if let Some(mean) = mean_peak_gain(report) {
        println!("Mean high2 - high1: {mean:.4}");
    }
}

/// Mean of `high2 - high1` over all resolved outcomes that carry a
/// high2.
pub fn mean_peak_gain(report: &WaveReport) -> Option<f64> {
    let gains: Vec<f64> = report
        .successes
        .iter()
        .chain(report.failures.iter())
        .filter_map(|o| o.peak_gain())
        .collect();
    if gains.is_empty() {
        None
    } else {
        Some(gains.iter().sum::<f64>() / gains.len() as f64)
    }
}
