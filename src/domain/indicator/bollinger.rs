//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) candles have no value.

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{
    align, BollingerValue, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT: f64 = 2.0;

pub fn bollinger_values(closes: &[f64], period: usize, mult: f64) -> Vec<BollingerValue> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    closes
        .windows(period)
        .map(|window| {
            let middle = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|c| {
                    let diff = c - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let stddev = variance.sqrt();
            BollingerValue {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            }
        })
        .collect()
}

/// The multiplier is carried as hundredths so the indicator type stays hashable.
pub fn calculate_bollinger(
    series: &CandleSeries,
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let compact = bollinger_values(&series.closes(), period, mult);
    let aligned = align(&compact, period.saturating_sub(1), series.len())
        .into_iter()
        .map(|v| v.map(IndicatorValue::Bollinger))
        .collect();
    IndicatorSeries::from_aligned(
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        series,
        aligned,
    )
}

pub fn mult_to_x100(mult: f64) -> u32 {
    (mult * 100.0).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::series_from_closes;

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&series_from_closes(&[1.0, 2.0, 3.0, 4.0]), 3, 200);
        assert!(series.bollinger_at(1).is_none());
        assert!(series.bollinger_at(2).is_some());
        assert!(series.bollinger_at(3).is_some());
    }

    #[test]
    fn bollinger_constant_prices_collapse() {
        let values = bollinger_values(&[50.0; 5], 5, 2.0);
        assert_eq!(values.len(), 1);
        let b = values[0];
        assert!((b.upper - 50.0).abs() < f64::EPSILON);
        assert!((b.middle - 50.0).abs() < f64::EPSILON);
        assert!((b.lower - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_population_stddev() {
        // mean 5, population variance 4, stddev 2
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let values = bollinger_values(&closes, 8, 2.0);
        let b = values[0];
        assert!((b.middle - 5.0).abs() < 1e-12);
        assert!((b.upper - 9.0).abs() < 1e-12);
        assert!((b.lower - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_bands_are_symmetric() {
        let values = bollinger_values(&[10.0, 12.0, 11.0, 15.0, 13.0, 9.0], 4, 1.5);
        for b in values {
            assert!(((b.upper - b.middle) - (b.middle - b.lower)).abs() < 1e-12);
            assert!(b.upper >= b.lower);
        }
    }

    #[test]
    fn bollinger_short_input() {
        let series = calculate_bollinger(&series_from_closes(&[1.0, 2.0]), 20, 200);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn mult_conversion() {
        assert_eq!(mult_to_x100(2.0), 200);
        assert_eq!(mult_to_x100(2.5), 250);
        assert_eq!(mult_to_x100(0.1), 10);
    }
}
