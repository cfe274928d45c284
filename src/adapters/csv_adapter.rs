//! CSV file candle source.
//!
//! Expects a header row naming `open_time,close_time,open,high,low,close,volume`
//! in any order. Extra columns are ignored; a missing column or short row
//! yields empty fields, which ingestion later rejects.

use crate::domain::candle::RawCandle;
use crate::domain::error::TraderError;
use crate::ports::data_port::DataPort;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

pub const COLUMNS: [&str; 7] = [
    "open_time",
    "close_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Column position for each of [`COLUMNS`], if present in the header.
fn column_positions(headers: &StringRecord) -> [Option<usize>; 7] {
    COLUMNS.map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

fn field(record: &StringRecord, position: Option<usize>) -> String {
    position
        .and_then(|p| record.get(p))
        .unwrap_or_default()
        .to_string()
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self) -> Result<Vec<RawCandle>, TraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| TraderError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let [open_time, close_time, open, high, low, close, volume] = column_positions(headers);

        let mut candles = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            candles.push(RawCandle {
                open_time: field(&record, open_time),
                close_time: field(&record, close_time),
                open: field(&record, open),
                high: field(&record, high),
                low: field(&record, low),
                close: field(&record, close),
                volume: field(&record, volume),
            });
        }

        Ok(candles)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
