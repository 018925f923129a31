use serde::Serialize;

use crate::data::Candle;
use crate::waves::{LocalHigh, WaveCandidate};

/// Rows skipped after `low2` before the forward scan may consume data.
/// The candle that defined `low2` must never take part in its own
/// classification, so the scan starts at `low2.position + BUFFER + 1`.
pub const LOOKAHEAD_BUFFER: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExitPoint {
    pub position: usize,
    pub price: f64,
}

/// The resolved trajectory of an accepted candidate. Immutable once the
/// forward scan completes.
#[derive(Debug, Clone, Serialize)]
pub struct WaveOutcome {
    pub candidate: WaveCandidate,
    /// Highest high observed between the scan start and the exit row
    /// (exclusive). Absent when the scan resolved before any row could
    /// be recorded, which a sparse tail can produce.
    pub high2: Option<LocalHigh>,
    pub exit: ExitPoint,
    pub verdict: Verdict,
}

impl WaveOutcome {
    /// `high2 - high1`, the quantity downstream aggregation averages.
    pub fn peak_gain(&self) -> Option<f64> {
        self.high2.map(|h| h.price - self.candidate.high1.price)
    }
}

/// One step's resolution, if any.
enum Step {
    Continue,
    Resolved(Verdict, Option<LocalHigh>),
    /// Success fired on the last row but no high2 exists to report.
    Abandoned,
}

/// Explicit state of the forward scan so the one-bar confirmation rule
/// is auditable in isolation: `Scanning -> {Success, Failure,
/// Unresolved}` with `breakout_seen` as the only intermediate flag.
struct ForwardScan {
    high1_price: f64,
    low1_price: f64,
    low2_price: f64,
    high2_retracement_ratio: f64,
    running_max_high: f64,
    running_min_low: f64,
    breakout_seen: bool,
    /// First-occurrence max over rows already consumed, i.e. excluding
    /// the row currently being stepped.
    high2_so_far: Option<LocalHigh>,
}

impl ForwardScan {
    fn new(candidate: &WaveCandidate, high2_retracement_ratio: f64) -> Self {
        Self {
            high1_price: candidate.high1.price,
            low1_price: candidate.low1.price,
            low2_price: candidate.low2.price,
            high2_retracement_ratio,
            running_max_high: f64::NEG_INFINITY,
            running_min_low: f64::INFINITY,
            breakout_seen: false,
            high2_so_far: None,
        }
    }

    fn step(&mut self, position: usize, high: f64, low: f64, is_last_row: bool) -> Step {
        self.running_max_high = self.running_max_high.max(high);
        self.running_min_low = self.running_min_low.min(low);

        let resolution = if self.running_max_high > self.high1_price {
            // Price has broken out above the first wave's peak.
            if is_last_row {
                // No room left to observe the retracement; take the
                // breakout as terminal. Without a recorded high2 there
                // is nothing to report and the candidate stays open.
                match self.high2_so_far {
                    Some(h) => Step::Resolved(Verdict::Success, Some(h)),
                    None => Step::Abandoned,
                }
            } else if !self.breakout_seen {
                // A single breakout bar is not sufficient; wait for the
                // post-breakout retracement before classifying.
                self.breakout_seen = true;
                Step::Continue
            } else {
                let fib_level2 = self.running_max_high
                    - (self.running_max_high - self.low2_price) * self.high2_retracement_ratio;
                if low <= fib_level2 {
                    Step::Resolved(Verdict::Success, self.high2_so_far)
                } else {
                    Step::Continue
                }
            }
        } else if self.running_min_low <= self.low1_price {
            // Fell back through the wave's origin low.
            Step::Resolved(Verdict::Failure, self.high2_so_far)
        } else {
            Step::Continue
        };

        if matches!(resolution, Step::Continue)
            && self.high2_so_far.is_none_or(|h| high > h.price)
        {
            self.high2_so_far = Some(LocalHigh {
                position,
                price: high,
            });
        }

        resolution
    }
}

/// Scan forward from just past `low2` and classify the candidate.
/// Returns `None` when the series ends without either condition firing
/// (unresolved), or when a terminal breakout leaves no high2 to report.
pub fn classify(
    series: &[Candle],
    candidate: &WaveCandidate,
    high2_retracement_ratio: f64,
) -> Option<WaveOutcome> {
    let start = candidate.low2.position + LOOKAHEAD_BUFFER + 1;
    if start >= series.len() {
        return None;
    }

    let last = series.len() - 1;
    let mut scan = ForwardScan::new(candidate, high2_retracement_ratio);

    for (position, candle) in series.iter().enumerate().skip(start) {
        match scan.step(position, candle.high, candle.low, position == last) {
            Step::Continue => {}
            Step::Abandoned => return None,
            Step::Resolved(verdict, high2) => {
                return Some(WaveOutcome {
                    candidate: *candidate,
                    high2,
                    exit: ExitPoint {
                        position,
                        price: candle.low,
                    },
                    verdict,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lows::LocalLow;
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, high: f64, low: f64) -> Candle {
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid datetime")
            + chrono::Duration::hours(i as i64);
        Candle {
            ts,
            open: low,
            high,
            low,
            close: high,
        }
    }

    fn series(highs_lows: &[(f64, f64)]) -> Vec<Candle> {
        highs_lows
            .iter()
            .enumerate()
            .map(|(i, &(h, l))| candle(i, h, l))
            .collect()
    }

    fn candidate(low1: (usize, f64), high1: (usize, f64), low2: (usize, f64)) -> WaveCandidate {
        WaveCandidate {
            low1: LocalLow {
                position: low1.0,
                price: low1.1,
            },
            high1: LocalHigh {
                position: high1.0,
                price: high1.1,
            },
            low2: LocalLow {
                position: low2.0,
                price: low2.1,
            },
        }
    }

    /// low1 = 100 @ 0, high1 = 200 @ 5, low2 = 130 @ 10. Scan starts
    /// at row 12.
    fn base_candidate() -> WaveCandidate {
        candidate((0, 100.0), (5, 200.0), (10, 130.0))
    }

    /// Rows 0..=11 only shape the setup; the scan never reads them.
    fn setup_rows() -> Vec<(f64, f64)> {
        vec![
            (110.0, 100.0), // 0: low1
            (130.0, 115.0),
            (150.0, 135.0),
            (170.0, 155.0),
            (190.0, 175.0),
            (200.0, 180.0), // 5: high1
            (185.0, 170.0),
            (170.0, 155.0),
            (160.0, 145.0),
            (150.0, 135.0),
            (140.0, 130.0), // 10: low2
            (145.0, 133.0), // 11: look-ahead buffer
        ]
    }

    #[test]
    fn test_classify_success_after_breakout_and_retrace() {
        // Breakout above 200 at row 15, confirmation delay, then the
        // retrace at row 17: fib2 = 210 - (210 - 130) * 0.382 = 179.44
        // and low 175 <= 179.44.
        let mut rows = setup_rows();
        rows.extend([
            (150.0, 140.0), // 12
            (160.0, 150.0), // 13
            (170.0, 160.0), // 14
            (210.0, 195.0), // 15: breakout bar, not terminal yet
            (208.0, 198.0), // 16: 198 > 179.44, keep scanning
            (200.0, 175.0), // 17: retrace crossed -> Success
            (205.0, 180.0), // 18
            (205.0, 180.0), // 19
        ]);
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        assert_eq!(outcome.verdict, Verdict::Success);
        assert_eq!(outcome.exit.position, 17);
        assert_eq!(outcome.exit.price, 175.0);

        // high2 = max high over rows 12..17 = 210 at row 15.
        let high2 = outcome.high2.unwrap();
        assert_eq!(high2.position, 15);
        assert_eq!(high2.price, 210.0);
        assert_eq!(outcome.peak_gain(), Some(10.0));
    }

    #[test]
    fn test_classify_failure_below_origin_low() {
        // Price falls through low1 = 100 at row 14 before any breakout.
        let mut rows = setup_rows();
        rows.extend([
            (150.0, 120.0), // 12
            (140.0, 110.0), // 13
            (120.0, 95.0),  // 14: 95 <= 100 -> Failure
            (130.0, 105.0), // 15
        ]);
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        assert_eq!(outcome.verdict, Verdict::Failure);
        assert_eq!(outcome.exit.position, 14);
        assert_eq!(outcome.exit.price, 95.0);

        // high2 = max high over rows 12..14 = 150 at row 12.
        let high2 = outcome.high2.unwrap();
        assert_eq!(high2.position, 12);
        assert_eq!(high2.price, 150.0);
    }

    #[test]
    fn test_classify_unresolved_when_neither_condition_fires() {
        // Price drifts between low1 and high1 until the series ends.
        let mut rows = setup_rows();
        rows.extend([
            (150.0, 140.0), // 12
            (155.0, 145.0), // 13
            (150.0, 140.0), // 14
        ]);
        let s = series(&rows);

        assert!(classify(&s, &base_candidate(), 0.382).is_none());
    }

    #[test]
    fn test_classify_breakout_on_last_row_is_terminal_success() {
        // The breakout bar is also the final row: classified Success
        // immediately, high2 taken from the rows before it.
        let mut rows = setup_rows();
        rows.extend([
            (150.0, 140.0), // 12
            (160.0, 150.0), // 13
            (210.0, 195.0), // 14: breakout on the last row
        ]);
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        assert_eq!(outcome.verdict, Verdict::Success);
        assert_eq!(outcome.exit.position, 14);
        assert_eq!(outcome.exit.price, 195.0);
        let high2 = outcome.high2.unwrap();
        assert_eq!(high2.position, 13);
        assert_eq!(high2.price, 160.0);
    }

    #[test]
    fn test_classify_breakout_on_first_and_last_row_is_unresolved() {
        // low2 at row 10, scan starts at 12 which is also the last row
        // and breaks out: the high2 window is empty, so the candidate
        // stays open instead of reporting a phantom peak.
        let mut rows = setup_rows();
        rows.push((210.0, 195.0)); // 12: first and last scanned row
        let s = series(&rows);

        assert!(classify(&s, &base_candidate(), 0.382).is_none());
    }

    #[test]
    fn test_classify_failure_with_empty_high2_window_is_tolerated() {
        // Failure on the very first scanned row: no high2 to report,
        // but the verdict still stands.
        let mut rows = setup_rows();
        rows.push((120.0, 95.0)); // 12: 95 <= 100 -> Failure immediately
        rows.push((120.0, 105.0)); // 13
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        assert_eq!(outcome.verdict, Verdict::Failure);
        assert_eq!(outcome.exit.position, 12);
        assert!(outcome.high2.is_none());
        assert!(outcome.peak_gain().is_none());
    }

    #[test]
    fn test_classify_unresolved_when_scan_window_is_empty() {
        // low2 sits too close to the series end for the buffered scan
        // to read anything.
        let rows = setup_rows(); // 12 rows, scan would start at 12
        let s = series(&rows);

        assert!(classify(&s, &base_candidate(), 0.382).is_none());
    }

    #[test]
    fn test_classify_exit_honors_lookahead_buffer() {
        // Even an immediate crash resolves no earlier than
        // low2.position + 2.
        let mut rows = setup_rows();
        rows.extend([(100.0, 50.0), (100.0, 50.0)]);
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        assert!(outcome.exit.position > base_candidate().low2.position + 1);
    }

    #[test]
    fn test_classify_success_condition_shadows_failure() {
        // After a breakout the running max stays above high1, so a
        // later plunge through low1 must resolve via the success
        // branch's retrace test, not as Failure.
        let mut rows = setup_rows();
        rows.extend([
            (150.0, 140.0), // 12
            (210.0, 195.0), // 13: breakout bar
            (205.0, 90.0),  // 14: below low1, but retrace test fires first
            (205.0, 180.0), // 15
        ]);
        let s = series(&rows);

        let outcome = classify(&s, &base_candidate(), 0.382).unwrap();
        // fib2 = 210 - (210 - 130) * 0.382 = 179.44; low 90 <= 179.44.
        assert_eq!(outcome.verdict, Verdict::Success);
        assert_eq!(outcome.exit.position, 14);
    }
}
