//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) candles have no value.

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

/// Compact EMA: `closes.len() - period + 1` values, the first being the SMA seed.
pub fn ema_values(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = closes[..period].iter().sum::<f64>() / period as f64;
    let mut values = Vec::with_capacity(closes.len() - period + 1);
    values.push(ema);

    for close in &closes[period..] {
        ema = close * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}

pub fn calculate_ema(series: &CandleSeries, period: usize) -> IndicatorSeries {
    let compact = ema_values(&series.closes(), period);
    let aligned = align(&compact, period.saturating_sub(1), series.len())
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();
    IndicatorSeries::from_aligned(IndicatorType::Ema(period), series, aligned)
}
