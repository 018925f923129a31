use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::WaveError;
use crate::data::{Candle, CandleColor};

/// A contiguous half-open slice `[start, end)` of series positions.
/// `green_ratio` is used only for stratified sampling, never for
/// detection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Block {
    /// One-based identifier, matching the split numbering of the
    /// original data dumps.
    pub id: usize,
    pub start: usize,
    pub end: usize,
    pub green_ratio: f64,
}

impl Block {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, series: &'a [Candle]) -> &'a [Candle] {
        &series[self.start..self.end]
    }
}

fn green_ratio(candles: &[Candle]) -> f64 {
    let green = candles
        .iter()
        .filter(|c| c.color() == CandleColor::Green)
        .count();
    green as f64 / candles.len() as f64
}

/// Split a series into `number_of_splits` contiguous blocks of
/// `len / number_of_splits` candles, the final block absorbing the
/// remainder. Fails fast on caller bugs: fewer than 3 splits or more
/// splits than candles.
pub fn split_into_blocks(
    series: &[Candle],
    number_of_splits: usize,
) -> Result<Vec<Block>, WaveError> {
    if series.is_empty() {
        return Err(WaveError::EmptySeries);
    }
    if number_of_splits < 3 || number_of_splits > series.len() {
        return Err(WaveError::BadSplitCount {
            splits: number_of_splits,
            len: series.len(),
        });
    }

    let per_block = series.len() / number_of_splits;
    let mut blocks = Vec::with_capacity(number_of_splits);
    for i in 0..number_of_splits {
        let start = i * per_block;
        let end = if i == number_of_splits - 1 {
            series.len()
        } else {
            (i + 1) * per_block
        };
        blocks.push(Block {
            id: i + 1,
            start,
            end,
            green_ratio: green_ratio(&series[start..end]),
        });
    }

    Ok(blocks)
}

/// Stratified block sampling: rank blocks by green ratio, cut the
/// ranking into three equal-ish thirds (bearish / sideways / bullish)
/// and draw `max(1, third_len / 2)` blocks from each without
/// replacement. Returned in stratum order bearish, bullish, sideways —
/// downstream file naming depends on that order, so it is preserved.
pub fn sample_blocks<R: Rng + ?Sized>(
    series: &[Candle],
    number_of_splits: usize,
    rng: &mut R,
) -> Result<Vec<Block>, WaveError> {
    let mut ranked = split_into_blocks(series, number_of_splits)?;
    ranked.sort_by(|a, b| a.green_ratio.total_cmp(&b.green_ratio));

    let third = ranked.len() / 3;
    let bearish = &ranked[..third];
    let sideways = &ranked[third..ranked.len() - third];
    let bullish = &ranked[ranked.len() - third..];

    let mut sampled: Vec<Block> = Vec::new();
    for stratum in [bearish, bullish, sideways] {
        let take = (stratum.len() / 2).max(1);
        sampled.extend(stratum.choose_multiple(rng, take).copied());
    }

    Ok(sampled)
}
