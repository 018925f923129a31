use serde::Serialize;

use std::collections::HashSet;

use crate::data::Candle;
use crate::lows::LocalLow;

/// A local high: position plus cached high price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalHigh {
    pub position: usize,
    pub price: f64,
}

/// An unresolved first wave leg plus its retracement-qualifying second
/// low. Identity is the `(low1.position, low2.position)` pair.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WaveCandidate {
    pub low1: LocalLow,
    pub high1: LocalHigh,
    pub low2: LocalLow,
}

pub type PairKey = (usize, usize);

impl WaveCandidate {
    pub fn key(&self) -> PairKey {
        (self.low1.position, self.low2.position)
    }

    /// Retracement level of the first leg:
    /// `high1 - (high1 - low1) * ratio`.
    pub fn fib_level(&self, retracement_ratio: f64) -> f64 {
        self.high1.price - (self.high1.price - self.low1.price) * retracement_ratio
    }
}

/// Highest high strictly between positions `a` and `b` (open interval
/// both ends). First occurrence wins on equal highs. `None` when no
/// candle lies strictly between.
pub fn highest_high_between(series: &[Candle], a: usize, b: usize) -> Option<LocalHigh> {
    if b <= a + 1 {
        return None;
    }

    let mut best: Option<LocalHigh> = None;
    for (offset, candle) in series[a + 1..b].iter().enumerate() {
        let position = a + 1 + offset;
        if best.is_none_or(|h| candle.high > h.price) {
            best = Some(LocalHigh {
                position,
                price: candle.high,
            });
        }
    }
    best
}

/// Pairs adjacent chain lows into raw wave candidates, deduplicated
/// globally by `(low1.position, low2.position)`: once a pair has been
/// seen from any row, later rows reproducing it are ignored.
#[derive(Debug, Default)]
pub struct PairBuilder {
    seen: HashSet<PairKey>,
}

impl PairBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the not-yet-seen candidates visible in this row's chain
    /// snapshot. Adjacent pairs with no candle strictly between them
    /// cannot carry a first-wave peak and are skipped.
    pub fn pairs_for_row(
        &mut self,
        series: &[Candle],
        chain: &[LocalLow],
        out: &mut Vec<WaveCandidate>,
    ) {
        if chain.len() < 2 {
            return;
        }

        for pair in chain.windows(2) {
            let (low1, low2) = (pair[0], pair[1]);
            let key = (low1.position, low2.position);
            if self.seen.contains(&key) {
                continue;
            }

            let Some(high1) = highest_high_between(series, low1.position, low2.position) else {
                continue;
            };

            self.seen.insert(key);
            out.push(WaveCandidate { low1, high1, low2 });
        }
    }
}

/// Fibonacci-band acceptance: the second low must land strictly above
/// the first low and at or below the retracement level of the first
/// leg. The upper bound is inclusive on purpose.
pub fn passes_fib_filter(candidate: &WaveCandidate, retracement_ratio: f64) -> bool {
    let fib_level = candidate.fib_level(retracement_ratio);
    candidate.low1.price < candidate.low2.price && candidate.low2.price <= fib_level
}
