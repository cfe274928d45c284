//! Signal evaluation: classifies one candle as BUY, SELL or HOLD.
//!
//! Evaluation is a pure function of the candle's [`IndicatorSample`], the
//! current side (flat or long) and the strategy parameters. A BUY is only
//! proposed while flat and a SELL only while long. Any indicator still
//! warming up yields HOLD.

use std::fmt;

use crate::domain::indicator::volume::is_volume_spike;
use crate::domain::indicator_engine::IndicatorSample;
use crate::domain::strategy::{
    StrategyConfig, StrategyKind, CONFIRMATION_EMA_PERIOD, TREND_EMA_PERIOD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

pub fn evaluate(sample: &IndicatorSample, is_long: bool, config: &StrategyConfig) -> Signal {
    if is_long {
        let exit = match config.kind {
            StrategyKind::MacdHistogram => histogram_exit(sample, config),
            _ => sell_condition(sample, config),
        };
        if exit == Some(true) {
            return Signal::Sell;
        }
        return Signal::Hold;
    }

    let buy = match config.kind {
        StrategyKind::RsiMacd => rsi_macd_entry(sample, config),
        StrategyKind::RsiEma200 => sample
            .ema(TREND_EMA_PERIOD)
            .map(|ema| sample.close < ema)
            .zip(rsi_macd_entry(sample, config))
            .map(|(below_trend, entry)| below_trend && entry),
        StrategyKind::MultiFactor => OpportunityChecklist::evaluate(sample, config).map(|c| c.all()),
        StrategyKind::MacdHistogram => sample.macd_histogram().map(|h| h > 0.0),
    };

    if buy == Some(true) {
        Signal::Buy
    } else {
        Signal::Hold
    }
}

/// `None` while the MACD signal line is warming up.
fn macd_above_signal(sample: &IndicatorSample) -> Option<bool> {
    Some(sample.macd_line()? > sample.macd_signal()?)
}

fn rsi_macd_entry(sample: &IndicatorSample, config: &StrategyConfig) -> Option<bool> {
    let rsi = sample.rsi?;
    Some(rsi < config.rsi_buy_threshold && macd_above_signal(sample)?)
}

/// Indicator exit shared by every strategy: RSI above the sell threshold
/// while MACD sits below its signal line.
fn sell_condition(sample: &IndicatorSample, config: &StrategyConfig) -> Option<bool> {
    let rsi = sample.rsi?;
    Some(rsi > config.rsi_sell_threshold && sample.macd_line()? < sample.macd_signal()?)
}

fn histogram_exit(sample: &IndicatorSample, config: &StrategyConfig) -> Option<bool> {
    let rsi = sample.rsi?;
    Some(sample.macd_histogram()? < 0.0 && rsi < config.histogram_exit_rsi_max)
}

/// Turns a HOLD into a SELL once a long position reaches the configured
/// take-profit level. Other signals pass through.
pub fn apply_take_profit(
    signal: Signal,
    close: f64,
    entry_price: Option<f64>,
    config: &StrategyConfig,
) -> Signal {
    match (signal, entry_price, config.take_profit_pct) {
        (Signal::Hold, Some(entry), Some(pct)) if close >= entry * (1.0 + pct / 100.0) => {
            Signal::Sell
        }
        _ => signal,
    }
}

/// The six conditions of the multi-factor entry, kept individually so they
/// can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpportunityChecklist {
    pub rsi_below_max: bool,
    pub macd_above_signal: bool,
    pub close_above_ema50: bool,
    pub close_at_lower_band: bool,
    pub volume_at_least_average: bool,
    pub bullish_rsi_divergence: bool,
}

impl OpportunityChecklist {
    /// `None` if any input is still warming up.
    pub fn evaluate(sample: &IndicatorSample, config: &StrategyConfig) -> Option<Self> {
        let rsi = sample.rsi?;
        let prev_rsi = sample.prev_rsi?;
        let prev_close = sample.prev_close?;
        let ema50 = sample.ema(CONFIRMATION_EMA_PERIOD)?;
        let lower = sample.bb_lower()?;
        let volume = sample.volume_stats?;

        Some(OpportunityChecklist {
            rsi_below_max: rsi < config.opportunity_rsi_max,
            macd_above_signal: macd_above_signal(sample)?,
            close_above_ema50: sample.close > ema50,
            close_at_lower_band: sample.close <= lower,
            volume_at_least_average: volume.latest >= volume.average,
            bullish_rsi_divergence: sample.close < prev_close && rsi > prev_rsi,
        })
    }

    pub fn all(&self) -> bool {
        self.rsi_below_max
            && self.macd_above_signal
            && self.close_above_ema50
            && self.close_at_lower_band
            && self.volume_at_least_average
            && self.bullish_rsi_divergence
    }

    /// Named results in evaluation order.
    pub fn checks(&self) -> [(&'static str, bool); 6] {
        [
            ("RSI below ceiling", self.rsi_below_max),
            ("MACD above signal", self.macd_above_signal),
            ("close above EMA(50)", self.close_above_ema50),
            ("close at or below lower Bollinger band", self.close_at_lower_band),
            ("volume at or above average", self.volume_at_least_average),
            ("bullish RSI divergence", self.bullish_rsi_divergence),
        ]
    }
}

/// Whether the sample's latest volume exceeds the configured spike threshold.
pub fn volume_spike(sample: &IndicatorSample, config: &StrategyConfig) -> Option<bool> {
    sample
        .volume_stats
        .map(|v| is_volume_spike(v.latest, v.average, config.volume_spike_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{BollingerValue, MacdValue, VolumeStats};
    use std::collections::BTreeMap;

    fn sample(rsi: f64, line: f64, signal: f64, close: f64) -> IndicatorSample {
        IndicatorSample {
            index: 10,
            time: chrono::DateTime::from_timestamp_millis(1_704_067_800_000).unwrap(),
            close,
            volume: 120.0,
            prev_close: Some(close + 1.0),
            rsi: Some(rsi),
            prev_rsi: Some(rsi - 1.0),
            macd: Some(MacdValue {
                line,
                signal: Some(signal),
                histogram: Some(line - signal),
            }),
            emas: BTreeMap::from([(50, close - 5.0), (200, close + 5.0)]),
            smas: BTreeMap::new(),
            bollinger: Some(BollingerValue {
                upper: close + 10.0,
                middle: close + 5.0,
                lower: close,
            }),
            volume_stats: Some(VolumeStats {
                average: 100.0,
                latest: 120.0,
            }),
        }
    }

    #[test]
    fn rsi_macd_buy_while_flat() {
        let config = StrategyConfig::default();
        assert_eq!(evaluate(&sample(40.0, 2.0, 1.0, 100.0), false, &config), Signal::Buy);
        assert_eq!(evaluate(&sample(55.0, 2.0, 1.0, 100.0), false, &config), Signal::Hold);
        assert_eq!(evaluate(&sample(40.0, 1.0, 2.0, 100.0), false, &config), Signal::Hold);
    }

    #[test]
    fn buy_conditions_ignored_while_long() {
        let config = StrategyConfig::default();
        assert_eq!(evaluate(&sample(40.0, 2.0, 1.0, 100.0), true, &config), Signal::Hold);
    }

    #[test]
    fn sell_while_long() {
        let config = StrategyConfig::default();
        assert_eq!(evaluate(&sample(70.0, 1.0, 2.0, 100.0), true, &config), Signal::Sell);
        assert_eq!(evaluate(&sample(70.0, 2.0, 1.0, 100.0), true, &config), Signal::Hold);
        assert_eq!(evaluate(&sample(60.0, 1.0, 2.0, 100.0), true, &config), Signal::Hold);
        assert_eq!(evaluate(&sample(70.0, 1.0, 2.0, 100.0), false, &config), Signal::Hold);
    }

    #[test]
    fn equal_macd_lines_do_not_sell() {
        let config = StrategyConfig::default();
        assert_eq!(evaluate(&sample(70.0, 1.5, 1.5, 100.0), true, &config), Signal::Hold);
    }

    #[test]
    fn missing_signal_line_holds() {
        let config = StrategyConfig::default();
        let mut s = sample(40.0, 2.0, 1.0, 100.0);
        s.macd = Some(MacdValue {
            line: 2.0,
            signal: None,
            histogram: None,
        });
        assert_eq!(evaluate(&s, false, &config), Signal::Hold);

        let mut s = sample(70.0, 1.0, 2.0, 100.0);
        s.rsi = None;
        assert_eq!(evaluate(&s, true, &config), Signal::Hold);
    }

    #[test]
    fn rsi_ema200_requires_close_below_trend() {
        let config = StrategyConfig::with_kind(StrategyKind::RsiEma200);
        let s = sample(40.0, 2.0, 1.0, 100.0);
        assert_eq!(evaluate(&s, false, &config), Signal::Buy);

        let mut above = s.clone();
        above.emas.insert(200, 90.0);
        assert_eq!(evaluate(&above, false, &config), Signal::Hold);

        let mut missing = s;
        missing.emas.remove(&200);
        assert_eq!(evaluate(&missing, false, &config), Signal::Hold);
    }

    #[test]
    fn histogram_strategy_follows_histogram_sign() {
        let config = StrategyConfig::with_kind(StrategyKind::MacdHistogram);
        // RSI is ignored on entry.
        assert_eq!(evaluate(&sample(80.0, 2.0, 1.0, 100.0), false, &config), Signal::Buy);
        assert_eq!(evaluate(&sample(30.0, 1.0, 2.0, 100.0), false, &config), Signal::Hold);

        assert_eq!(evaluate(&sample(40.0, 1.0, 2.0, 100.0), true, &config), Signal::Sell);
        assert_eq!(evaluate(&sample(50.0, 1.0, 2.0, 100.0), true, &config), Signal::Hold);
        assert_eq!(evaluate(&sample(40.0, 2.0, 1.0, 100.0), true, &config), Signal::Hold);
    }

    #[test]
    fn take_profit_turns_hold_into_sell() {
        let config = StrategyConfig {
            take_profit_pct: Some(1.0),
            ..StrategyConfig::default()
        };
        assert_eq!(apply_take_profit(Signal::Hold, 101.0, Some(100.0), &config), Signal::Sell);
        assert_eq!(apply_take_profit(Signal::Hold, 100.5, Some(100.0), &config), Signal::Hold);
        assert_eq!(apply_take_profit(Signal::Hold, 150.0, None, &config), Signal::Hold);
        assert_eq!(apply_take_profit(Signal::Buy, 90.0, None, &config), Signal::Buy);

        let off = StrategyConfig::default();
        assert_eq!(apply_take_profit(Signal::Hold, 150.0, Some(100.0), &off), Signal::Hold);
    }

    #[test]
    fn multi_factor_requires_all_six() {
        let config = StrategyConfig::with_kind(StrategyKind::MultiFactor);
        let s = sample(45.0, 2.0, 1.0, 100.0);
        let checklist = OpportunityChecklist::evaluate(&s, &config).unwrap();
        assert!(checklist.all());
        assert_eq!(evaluate(&s, false, &config), Signal::Buy);

        let mut no_divergence = s.clone();
        no_divergence.prev_rsi = Some(50.0);
        let checklist = OpportunityChecklist::evaluate(&no_divergence, &config).unwrap();
        assert!(!checklist.bullish_rsi_divergence);
        assert!(!checklist.all());
        assert_eq!(evaluate(&no_divergence, false, &config), Signal::Hold);

        let mut thin_volume = s.clone();
        thin_volume.volume_stats = Some(VolumeStats {
            average: 100.0,
            latest: 99.0,
        });
        assert_eq!(evaluate(&thin_volume, false, &config), Signal::Hold);

        let mut above_band = s;
        above_band.bollinger = Some(BollingerValue {
            upper: 120.0,
            middle: 110.0,
            lower: 99.0,
        });
        assert_eq!(evaluate(&above_band, false, &config), Signal::Hold);
    }

    #[test]
    fn checklist_needs_previous_candle() {
        let config = StrategyConfig::with_kind(StrategyKind::MultiFactor);
        let mut s = sample(45.0, 2.0, 1.0, 100.0);
        s.prev_close = None;
        assert!(OpportunityChecklist::evaluate(&s, &config).is_none());
    }

    #[test]
    fn checks_are_named_in_order() {
        let config = StrategyConfig::with_kind(StrategyKind::MultiFactor);
        let checklist = OpportunityChecklist::evaluate(&sample(45.0, 2.0, 1.0, 100.0), &config).unwrap();
        let names: Vec<&str> = checklist.checks().iter().map(|(n, _)| *n).collect();
        assert_eq!(names[0], "RSI below ceiling");
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn volume_spike_uses_threshold() {
        let config = StrategyConfig::default();
        let mut s = sample(45.0, 2.0, 1.0, 100.0);
        assert_eq!(volume_spike(&s, &config), Some(false));
        s.volume_stats = Some(VolumeStats {
            average: 100.0,
            latest: 200.0,
        });
        assert_eq!(volume_spike(&s, &config), Some(true));
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
    }
}
