//! Technical indicator implementations.
//!
//! Every indicator comes in two shapes:
//! - a compact calculator over closing prices that returns only valid values
//!   (`ema_values`, `rsi_values`, ...), shorter than the input by its warm-up;
//! - a series calculator that maps the compact output back onto candle
//!   indices through [`align`], yielding one [`IndicatorPoint`] per candle.
//!
//! [`align`] is the only place where compact offsets are translated to candle
//! indices.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod pattern;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume::calculate_volume;

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::candle::CandleSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub line: f64,
    /// `None` until the signal EMA has seen `signal` MACD values.
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeStats {
    pub average: f64,
    pub latest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd(MacdValue),
    Bollinger(BollingerValue),
    Volume(VolumeStats),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub time: DateTime<Utc>,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    /// Rolling volume average; a window of 0 averages every candle so far.
    Volume {
        window: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_aligned(
        indicator_type: IndicatorType,
        series: &CandleSeries,
        aligned: Vec<Option<IndicatorValue>>,
    ) -> Self {
        let values = series
            .candles()
            .iter()
            .zip(aligned)
            .map(|(candle, value)| IndicatorPoint {
                time: candle.open_time,
                value,
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.value_at(index) {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }

    pub fn macd_at(&self, index: usize) -> Option<MacdValue> {
        match self.value_at(index) {
            Some(IndicatorValue::Macd(v)) => Some(v),
            _ => None,
        }
    }

    pub fn bollinger_at(&self, index: usize) -> Option<BollingerValue> {
        match self.value_at(index) {
            Some(IndicatorValue::Bollinger(v)) => Some(v),
            _ => None,
        }
    }

    pub fn volume_at(&self, index: usize) -> Option<VolumeStats> {
        match self.value_at(index) {
            Some(IndicatorValue::Volume(v)) => Some(v),
            _ => None,
        }
    }

    /// Number of candles carrying a value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.value.is_some()).count()
    }
}

/// Map a compact indicator output onto candle indices.
///
/// Candle `i` receives `compact[i - warmup]` when `i >= warmup`, otherwise
/// `None`. The output always has exactly `len` entries.
pub fn align<T: Copy>(compact: &[T], warmup: usize, len: usize) -> Vec<Option<T>> {
    (0..len)
        .map(|i| {
            if i >= warmup {
                compact.get(i - warmup).copied()
            } else {
                None
            }
        })
        .collect()
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Volume { window: 0 } => write!(f, "VOLUME"),
            IndicatorType::Volume { window } => write!(f, "VOLUME({})", window),
        }
    }
}
