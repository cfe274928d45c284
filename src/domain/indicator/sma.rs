//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) candles have no value.

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{align, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn sma_values(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }
    closes
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

pub fn calculate_sma(series: &CandleSeries, period: usize) -> IndicatorSeries {
    let compact = sma_values(&series.closes(), period);
    let aligned = align(&compact, period.saturating_sub(1), series.len())
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();
    IndicatorSeries::from_aligned(IndicatorType::Sma(period), series, aligned)
}
