//! OHLCV candle representation and series ingestion.
//!
//! A [`CandleSeries`] is the ordered, validated substrate every indicator reads.
//! Index within the series is the candle's identity for alignment.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::error::TraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// |open - close|
    pub fn body(&self) -> f64 {
        (self.open - self.close).abs()
    }

    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    fn check_values(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("volume must be non-negative, got {}", self.volume));
        }
        if self.high < self.low {
            return Err(format!("high {} is below low {}", self.high, self.low));
        }
        if self.close_time < self.open_time {
            return Err("close_time precedes open_time".to_string());
        }
        Ok(())
    }
}

/// Candle as delivered by a data source: every field is text, the way
/// exchange APIs and CSV exports hand them over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandle {
    pub open_time: String,
    pub close_time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl RawCandle {
    pub fn parse(&self) -> Result<Candle, String> {
        Ok(Candle {
            open_time: parse_timestamp(&self.open_time, "open_time")?,
            close_time: parse_timestamp(&self.close_time, "close_time")?,
            open: parse_number(&self.open, "open")?,
            high: parse_number(&self.high, "high")?,
            low: parse_number(&self.low, "low")?,
            close: parse_number(&self.close, "close")?,
            volume: parse_number(&self.volume, "volume")?,
        })
    }
}

/// Accepts epoch milliseconds or an RFC 3339 timestamp.
pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("missing {field}"));
    }
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| format!("{field} out of range: {millis}"));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid {field} '{value}': {e}"))
}

fn parse_number(value: &str, field: &str) -> Result<f64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("missing {field}"));
    }
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("invalid {field} '{value}'"))?;
    if !parsed.is_finite() {
        return Err(format!("{field} is not finite"));
    }
    Ok(parsed)
}

/// A record dropped during ingestion, with its position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub index: usize,
    pub reason: String,
}

impl From<Rejection> for TraderError {
    fn from(r: Rejection) -> Self {
        TraderError::MalformedCandle {
            index: r.index,
            reason: r.reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Parse and validate raw records. Malformed or out-of-order records are
    /// logged and skipped; the remaining ones form the series.
    pub fn ingest<I>(raws: I) -> (Self, Vec<Rejection>)
    where
        I: IntoIterator<Item = RawCandle>,
    {
        let parsed = raws.into_iter().map(|raw| raw.parse());
        Self::build(parsed)
    }

    /// Validate already-typed candles with the same rules as [`CandleSeries::ingest`].
    pub fn from_candles(candles: Vec<Candle>) -> (Self, Vec<Rejection>) {
        Self::build(candles.into_iter().map(Ok))
    }

    fn build<I>(records: I) -> (Self, Vec<Rejection>)
    where
        I: Iterator<Item = Result<Candle, String>>,
    {
        let mut rejections = Vec::new();
        let mut checked: Vec<(usize, Candle)> = Vec::new();

        for (index, record) in records.enumerate() {
            match record.and_then(|candle| candle.check_values().map(|()| candle)) {
                Ok(candle) => checked.push((index, candle)),
                Err(reason) => rejections.push(Rejection { index, reason }),
            }
        }

        let mut candles: Vec<Candle> = Vec::with_capacity(checked.len());
        for (pos, (index, candle)) in checked.iter().enumerate() {
            let prev = candles.last().map(|c| c.open_time);
            let reason = match prev {
                Some(prev) if candle.open_time <= prev => Some(format!(
                    "open_time {} does not follow previous {}",
                    candle.open_time.to_rfc3339(),
                    prev.to_rfc3339()
                )),
                _ if jumps_ahead(prev, candle, &checked[pos + 1..]) => Some(format!(
                    "open_time {} is ahead of the records that follow it",
                    candle.open_time.to_rfc3339()
                )),
                _ => None,
            };
            match reason {
                Some(reason) => rejections.push(Rejection {
                    index: *index,
                    reason,
                }),
                None => candles.push(candle.clone()),
            }
        }

        rejections.sort_by_key(|r| r.index);
        for r in &rejections {
            warn!(index = r.index, reason = %r.reason, "rejecting malformed candle");
        }

        (CandleSeries { candles }, rejections)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// The first `n` candles as a new series. Replaying a prefix must give the
    /// same decisions as the full run at the prefix's last index.
    pub fn prefix(&self, n: usize) -> CandleSeries {
        CandleSeries {
            candles: self.candles[..n.min(self.candles.len())].to_vec(),
        }
    }
}

/// A candle dated past its next two successors while those still follow the
/// last accepted candle.
fn jumps_ahead(prev: Option<DateTime<Utc>>, candle: &Candle, rest: &[(usize, Candle)]) -> bool {
    let Some((_, next)) = rest.first() else {
        return false;
    };
    let next_fits = next.open_time < candle.open_time
        && prev.is_none_or(|prev| next.open_time > prev);
    let after_fits = rest
        .get(1)
        .is_none_or(|(_, after)| after.open_time < candle.open_time);
    next_fits && after_fits
}
