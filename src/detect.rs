use crate::WaveError;
use crate::data::Candle;
use crate::extrema::{find_local_minima, minima_mask};
use crate::lows::LowTracker;
use crate::outcome::{Verdict, WaveOutcome, classify};
use crate::waves::{PairBuilder, WaveCandidate, passes_fib_filter};

/// Knobs for one detection run. Defaults match the reference study:
/// 0.618 entry retracement, 0.382 exit retracement.
#[derive(Debug, Clone, Copy)]
pub struct DetectParams {
    /// Minimum separation between local minima (candles).
    pub minima_distance: usize,
    /// Pops needed in one row to wipe the low chain entirely.
    pub reset_threshold: usize,
    /// First-leg retracement band for accepting a second low.
    pub retracement_ratio: f64,
    /// Post-breakout retracement ratio used by the forward scan.
    pub high2_retracement_ratio: f64,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            minima_distance: 1,
            reset_threshold: 3,
            retracement_ratio: 0.618,
            high2_retracement_ratio: 0.382,
        }
    }
}

/// All classified candidates of one run. Successes and failures carry
/// their trajectories; unresolved candidates are reported separately
/// for auditability and belong to neither set.
#[derive(Debug, Default)]
pub struct WaveReport {
    pub successes: Vec<WaveOutcome>,
    pub failures: Vec<WaveOutcome>,
    pub unresolved: Vec<WaveCandidate>,
}

impl WaveReport {
    pub fn resolved_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Successes over resolved candidates. `None` when nothing
    /// resolved.
    pub fn success_ratio(&self) -> Option<f64> {
        let resolved = self.resolved_count();
        if resolved == 0 {
            None
        } else {
            Some(self.successes.len() as f64 / resolved as f64)
        }
    }

    pub fn merge(&mut self, other: WaveReport) {
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
        self.unresolved.extend(other.unresolved);
    }
}

fn validate_series(series: &[Candle]) -> Result<(), WaveError> {
    if series.is_empty() {
        return Err(WaveError::EmptySeries);
    }
    for (i, pair) in series.windows(2).enumerate() {
        if pair[1].ts <= pair[0].ts {
            return Err(WaveError::UnsortedSeries { position: i + 1 });
        }
    }
    Ok(())
}

/// Run the full detection pipeline over one series: local minima ->
/// low chain -> deduplicated adjacent pairs -> Fibonacci band ->
/// forward-scan classification.
///
/// A single sequential pass; ordering is load-bearing for both the
/// chain reset rule and the forward scan. Independent series (e.g.
/// sampled blocks) can run in parallel at the caller.
pub fn detect_waves(series: &[Candle], params: &DetectParams) -> Result<WaveReport, WaveError> {
    validate_series(series)?;

    let lows: Vec<f64> = series.iter().map(|c| c.low).collect();
    let minima = find_local_minima(&lows, params.minima_distance);
    let is_minimum = minima_mask(series.len(), &minima);

    let mut tracker = LowTracker::new(params.reset_threshold);
    let mut builder = PairBuilder::new();
    let mut accepted: Vec<WaveCandidate> = Vec::new();
    let mut raw: Vec<WaveCandidate> = Vec::new();

    for (position, candle) in series.iter().enumerate() {
        let chain = tracker.observe(position, candle.low, is_minimum[position]);

        raw.clear();
        builder.pairs_for_row(series, chain, &mut raw);
        accepted.extend(
            raw.iter()
                .filter(|c| passes_fib_filter(c, params.retracement_ratio)),
        );
    }

    let mut report = WaveReport::default();
    for candidate in accepted {
        match classify(series, &candidate, params.high2_retracement_ratio) {
            Some(outcome) => match outcome.verdict {
                Verdict::Success => report.successes.push(outcome),
                Verdict::Failure => report.failures.push(outcome),
            },
            None => report.unresolved.push(candidate),
        }
    }

    Ok(report)
}
