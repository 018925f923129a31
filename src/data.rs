use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use std::fs::File;
use std::path::PathBuf;

/// One CSV row as exported by the usual exchange dumps:
/// epoch seconds plus OHLC prices. Extra columns are ignored.
#[derive(Debug, Deserialize)]
pub struct CandleRow {
    #[serde(alias = "time")]
    pub unix: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A single OHLC candle. Immutable once loaded; a series is ordered by
/// timestamp and referenced everywhere else by zero-based position.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleColor {
    Green,
    Red,
    Doji,
}

impl Candle {
    pub fn color(&self) -> CandleColor {
        if self.close > self.open {
            CandleColor::Green
        } else if self.close < self.open {
            CandleColor::Red
        } else {
            CandleColor::Doji
        }
    }
}

/// Convert raw rows to candles, sort by timestamp and reject duplicate
/// timestamps. Positions are dense after this, which the detection
/// pipeline relies on.
pub fn candles_from_rows(rows: Vec<CandleRow>) -> Result<Vec<Candle>> {
    let mut candles: Vec<Candle> = rows
        .into_iter()
        .map(|row| {
            let ts = DateTime::from_timestamp(row.unix, 0)
                .with_context(|| format!("invalid unix timestamp: {}", row.unix))?;
            Ok(Candle {
                ts,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            })
        })
        .collect::<Result<_>>()?;

    candles.sort_by_key(|c| c.ts);

    for pair in candles.windows(2) {
        if pair[1].ts == pair[0].ts {
            bail!("duplicate timestamp in input: {}", pair[0].ts);
        }
    }

    Ok(candles)
}

pub fn get_candles_from_input_file(input: &PathBuf) -> Result<Vec<Candle>> {
    let file =
        File::open(input).with_context(|| format!("failed to open input file: {:?}", input))?;

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut rows: Vec<CandleRow> = Vec::new();
    for result in rdr.deserialize::<CandleRow>() {
        let row: CandleRow = result.with_context(|| "failed to deserialize CSV row")?;
        rows.push(row);
    }

    candles_from_rows(rows)
}
