//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line exists from candle slow-1, so the compact output is
//! `slow-1` shorter than the closes and candle `i` maps to `macd[i + 1 - slow]`.
//! Signal and histogram stay empty for a further signal-1 candles.

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue, MacdValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Candles before the first MACD line value.
pub fn macd_warmup(fast: usize, slow: usize) -> usize {
    fast.max(slow).saturating_sub(1)
}

pub fn macd_values(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Vec<MacdValue> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Vec::new();
    }

    let ema_fast = ema_values(closes, fast);
    let ema_slow = ema_values(closes, slow);
    if ema_fast.is_empty() || ema_slow.is_empty() {
        return Vec::new();
    }

    let warmup = macd_warmup(fast, slow);
    let line: Vec<f64> = (warmup..closes.len())
        .map(|i| ema_fast[i + 1 - fast] - ema_slow[i + 1 - slow])
        .collect();

    let signal_line = ema_values(&line, signal_period);

    line.iter()
        .enumerate()
        .map(|(j, &line)| {
            let signal = if j + 1 >= signal_period {
                signal_line.get(j + 1 - signal_period).copied()
            } else {
                None
            };
            MacdValue {
                line,
                signal,
                histogram: signal.map(|s| line - s),
            }
        })
        .collect()
}

pub fn calculate_macd(
    series: &CandleSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let compact = macd_values(&series.closes(), fast, slow, signal_period);
    let aligned = align(&compact, macd_warmup(fast, slow), series.len())
        .into_iter()
        .map(|v| v.map(IndicatorValue::Macd))
        .collect();
    IndicatorSeries::from_aligned(
        IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        series,
        aligned,
    )
}
