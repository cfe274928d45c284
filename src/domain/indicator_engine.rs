//! Batch indicator computation and per-candle sampling.
//!
//! Each requested indicator is computed once over the whole series. Every
//! calculator is a causal recurrence, so the value at candle `i` depends only
//! on candles `0..=i` and a prefix replay yields identical samples.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    calculate_volume, BollingerValue, IndicatorSeries, IndicatorType, MacdValue, VolumeStats,
};
use crate::domain::strategy::StrategyConfig;

pub fn compute_indicator(series: &CandleSeries, indicator: &IndicatorType) -> IndicatorSeries {
    match *indicator {
        IndicatorType::Sma(period) => calculate_sma(series, period),
        IndicatorType::Ema(period) => calculate_ema(series, period),
        IndicatorType::Rsi(period) => calculate_rsi(series, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(series, fast, slow, signal),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(series, period, stddev_mult_x100),
        IndicatorType::Volume { window } => calculate_volume(series, window),
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<IndicatorType, IndicatorSeries>,
}

pub fn compute_indicators(series: &CandleSeries, indicators: &[IndicatorType]) -> IndicatorSet {
    let mut set = IndicatorSet::default();
    for indicator in indicators {
        if !set.series.contains_key(indicator) {
            set.series
                .insert(indicator.clone(), compute_indicator(series, indicator));
        }
    }
    set
}

impl IndicatorSet {
    pub fn get(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn simple(&self, indicator: &IndicatorType, index: usize) -> Option<f64> {
        self.get(indicator).and_then(|s| s.simple_at(index))
    }

    /// Gather every value the signal rules read for candle `index`.
    pub fn sample(
        &self,
        candles: &CandleSeries,
        index: usize,
        config: &StrategyConfig,
    ) -> Option<IndicatorSample> {
        let candle = candles.get(index)?;
        let prev = index.checked_sub(1);
        let rsi_type = IndicatorType::Rsi(config.rsi_period);

        let emas = config
            .all_ema_periods()
            .into_iter()
            .filter_map(|p| self.simple(&IndicatorType::Ema(p), index).map(|v| (p, v)))
            .collect();
        let smas = config
            .sma_periods
            .iter()
            .filter_map(|&p| self.simple(&IndicatorType::Sma(p), index).map(|v| (p, v)))
            .collect();

        Some(IndicatorSample {
            index,
            time: candle.open_time,
            close: candle.close,
            volume: candle.volume,
            prev_close: prev.and_then(|p| candles.get(p)).map(|c| c.close),
            rsi: self.simple(&rsi_type, index),
            prev_rsi: prev.and_then(|p| self.simple(&rsi_type, p)),
            macd: self
                .get(&config.macd_type())
                .and_then(|s| s.macd_at(index)),
            emas,
            smas,
            bollinger: self
                .get(&config.bollinger_type())
                .and_then(|s| s.bollinger_at(index)),
            volume_stats: self
                .get(&config.volume_type())
                .and_then(|s| s.volume_at(index)),
        })
    }
}

/// Indicator values aligned to one candle. `None` means the indicator is
/// still warming up at this index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSample {
    pub index: usize,
    /// Open time of the candle.
    pub time: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
    pub prev_close: Option<f64>,
    pub rsi: Option<f64>,
    pub prev_rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub emas: BTreeMap<usize, f64>,
    pub smas: BTreeMap<usize, f64>,
    pub bollinger: Option<BollingerValue>,
    pub volume_stats: Option<VolumeStats>,
}

impl IndicatorSample {
    pub fn ema(&self, period: usize) -> Option<f64> {
        self.emas.get(&period).copied()
    }

    pub fn sma(&self, period: usize) -> Option<f64> {
        self.smas.get(&period).copied()
    }

    pub fn macd_line(&self) -> Option<f64> {
        self.macd.map(|m| m.line)
    }

    pub fn macd_signal(&self) -> Option<f64> {
        self.macd.and_then(|m| m.signal)
    }

    pub fn macd_histogram(&self) -> Option<f64> {
        self.macd.and_then(|m| m.histogram)
    }

    pub fn bb_lower(&self) -> Option<f64> {
        self.bollinger.map(|b| b.lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::series_from_closes;

    fn small_config() -> StrategyConfig {
        StrategyConfig {
            rsi_period: 3,
            macd_fast: 2,
            macd_slow: 4,
            macd_signal: 2,
            bollinger_period: 3,
            ema_periods: vec![2, 3],
            sma_periods: vec![2],
            ..StrategyConfig::default()
        }
    }

    #[test]
    fn computes_each_requested_indicator_once() {
        let candles = series_from_closes(&[1.0, 2.0, 3.0]);
        let set = compute_indicators(
            &candles,
            &[IndicatorType::Ema(2), IndicatorType::Ema(2), IndicatorType::Rsi(3)],
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&IndicatorType::Ema(2)).unwrap().len(), 3);
    }

    #[test]
    fn sample_before_warmup_is_empty() {
        let config = small_config();
        let candles = series_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0]);
        let set = compute_indicators(&candles, &config.required_indicators());

        let first = set.sample(&candles, 0, &config).unwrap();
        assert_eq!(first.close, 10.0);
        assert_eq!(first.prev_close, None);
        assert_eq!(first.rsi, None);
        assert_eq!(first.macd, None);
        assert_eq!(first.bollinger, None);
        assert!(first.emas.is_empty());
        assert!(first.volume_stats.is_some());
    }

    #[test]
    fn sample_after_warmup_is_populated() {
        let config = small_config();
        let candles = series_from_closes(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0]);
        let set = compute_indicators(&candles, &config.required_indicators());

        let s = set.sample(&candles, 5, &config).unwrap();
        assert_eq!(s.prev_close, Some(13.0));
        assert!(s.rsi.is_some());
        assert!(s.prev_rsi.is_some());
        assert!(s.macd_signal().is_some());
        assert!(s.ema(2).is_some());
        assert!(s.ema(3).is_some());
        assert_eq!(s.sma(2), Some(13.5));
        assert!(s.bb_lower().is_some());
    }

    #[test]
    fn sample_out_of_range() {
        let config = small_config();
        let candles = series_from_closes(&[10.0]);
        let set = compute_indicators(&candles, &config.required_indicators());
        assert!(set.sample(&candles, 1, &config).is_none());
    }
}
