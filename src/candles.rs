use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::delta_client::CandleQuery;
use crate::error::DeltaError;
use crate::models::{Candle, CandleRow};

pub const CSV_HEADER: [&str; 7] = ["symbol", "time", "open", "high", "low", "close", "volume"];

/// `[now - days_back, now]` in Unix seconds.
pub fn lookback_query(now: DateTime<Utc>, days_back: u32, resolution: &str) -> CandleQuery {
    let end = now.timestamp();
    CandleQuery {
        resolution: resolution.to_string(),
        start: end - i64::from(days_back) * 24 * 60 * 60,
        end,
    }
}

/// ISO-8601 UTC rendering of a Unix timestamp, e.g. `2025-05-25T00:00:00+00:00`.
pub fn iso_time(unix_secs: i64) -> Result<String, DeltaError> {
    DateTime::<Utc>::from_timestamp(unix_secs, 0)
        .map(|t| t.to_rfc3339())
        .ok_or_else(|| DeltaError::InvalidNumber {
            field: "time",
            value: unix_secs.to_string(),
        })
}

pub fn candle_row(symbol: &str, candle: &Candle) -> Result<CandleRow, DeltaError> {
    Ok(CandleRow {
        symbol: symbol.to_string(),
        time: iso_time(candle.time)?,
        open: candle.open.clone(),
        high: candle.high.clone(),
        low: candle.low.clone(),
        close: candle.close.clone(),
        volume: candle.volume.clone(),
    })
}

/// CSV sink for candle rows. Creating it truncates the target and writes the header.
pub struct CandleWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl CandleWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating CSV file {}", path.display()))?;
        Self::new(file)
    }
}

impl<W: Write> CandleWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer, rows_written: 0 })
    }

    /// Append every candle for `symbol`; returns how many rows were written.
    pub fn write_candles(&mut self, symbol: &str, candles: &[Candle]) -> Result<usize> {
        for candle in candles {
            let row = candle_row(symbol, candle)?;
            self.writer.serialize(&row)?;
        }
        self.rows_written += candles.len();
        Ok(candles.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing candle CSV: {}", e.error()))
    }
}
