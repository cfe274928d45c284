//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n candles have no value (n price changes seed the averages).

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Compact RSI: `closes.len() - period` values, the first belonging to candle `period`.
pub fn rsi_values(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| if c > 0.0 { c } else { 0.0 };
    let loss = |c: f64| if c < 0.0 { -c } else { 0.0 };

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(closes.len() - period);
    values.push(rsi_from(avg_gain, avg_loss));

    for &change in &changes[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        values.push(rsi_from(avg_gain, avg_loss));
    }

    values
}

pub fn calculate_rsi(series: &CandleSeries, period: usize) -> IndicatorSeries {
    let compact = rsi_values(&series.closes(), period);
    let aligned = align(&compact, period, series.len())
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();
    IndicatorSeries::from_aligned(IndicatorType::Rsi(period), series, aligned)
}
