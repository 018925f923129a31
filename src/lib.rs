//! Detection of candidate "three-point" price wave structures in OHLC
//! candle series: local-low chains, Fibonacci-filtered wave pairs, and a
//! forward-scanning success/failure classifier, plus stratified block
//! sampling for repeated independent runs over sub-ranges of a long
//! series.
//!
//! The crate produces in-memory typed values only. CSV loading and
//! result writing live in [`data`] and [`output`] as thin collaborators;
//! statistics and plotting are left to callers.

pub mod data;
pub mod detect;
pub mod extrema;
pub mod lows;
pub mod outcome;
pub mod output;
pub mod sampling;
pub mod waves;

pub use detect::{DetectParams, WaveReport, detect_waves};
pub use sampling::{Block, sample_blocks};

/// Fail-fast errors for caller bugs. Anything else (sparse windows,
/// unresolved candidates) is an expected edge case, not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaveError {
    #[error("series is empty")]
    EmptySeries,

    #[error("series is not strictly increasing in timestamp at position {position}")]
    UnsortedSeries { position: usize },

    #[error("number_of_splits = {splits} is invalid for a series of {len} candles (need 3 <= splits <= len)")]
    BadSplitCount { splits: usize, len: usize },
}
