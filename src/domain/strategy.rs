//! Strategy variants and their tunable parameters.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::bollinger::{mult_to_x100, DEFAULT_PERIOD, DEFAULT_STDDEV_MULT};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::volume::DEFAULT_SPIKE_THRESHOLD;
use crate::domain::indicator::IndicatorType;

/// EMA period the RSI+EMA200 entry filter compares against.
pub const TREND_EMA_PERIOD: usize = 200;
/// EMA period the multi-factor filter requires price to sit above.
pub const CONFIRMATION_EMA_PERIOD: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    #[default]
    RsiMacd,
    RsiEma200,
    MultiFactor,
    MacdHistogram,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::RsiMacd => "RSI+MACD",
            StrategyKind::RsiEma200 => "RSI+EMA200",
            StrategyKind::MultiFactor => "multi-factor",
            StrategyKind::MacdHistogram => "MACD-histogram",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsi+macd" => Ok(StrategyKind::RsiMacd),
            "rsi+ema200" => Ok(StrategyKind::RsiEma200),
            "multi-factor" | "multifactor" => Ok(StrategyKind::MultiFactor),
            "macd-histogram" | "histogram" => Ok(StrategyKind::MacdHistogram),
            other => Err(format!(
                "unknown strategy '{}', expected one of RSI+MACD, RSI+EMA200, multi-factor, MACD-histogram",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_stddev: f64,
    pub ema_periods: Vec<usize>,
    pub sma_periods: Vec<usize>,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    pub profit_cap_pct: f64,
    pub opportunity_rsi_max: f64,
    pub volume_window: usize,
    pub volume_spike_threshold: f64,
    /// RSI must be below this for the MACD-histogram exit.
    pub histogram_exit_rsi_max: f64,
    /// Fixed exit once close reaches `entry * (1 + pct / 100)`. Off when `None`.
    pub take_profit_pct: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            kind: StrategyKind::default(),
            rsi_period: 14,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            bollinger_period: DEFAULT_PERIOD,
            bollinger_stddev: DEFAULT_STDDEV_MULT,
            ema_periods: vec![9, 21, 200],
            sma_periods: Vec::new(),
            rsi_buy_threshold: 50.0,
            rsi_sell_threshold: 60.0,
            profit_cap_pct: 7.0,
            opportunity_rsi_max: 60.0,
            volume_window: 0,
            volume_spike_threshold: DEFAULT_SPIKE_THRESHOLD,
            histogram_exit_rsi_max: 45.0,
            take_profit_pct: None,
        }
    }
}

impl StrategyConfig {
    pub fn with_kind(kind: StrategyKind) -> Self {
        StrategyConfig {
            kind,
            ..Self::default()
        }
    }

    pub fn macd_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn bollinger_type(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bollinger_period,
            stddev_mult_x100: mult_to_x100(self.bollinger_stddev),
        }
    }

    pub fn volume_type(&self) -> IndicatorType {
        IndicatorType::Volume {
            window: self.volume_window,
        }
    }

    /// EMA periods to compute: the configured ones plus whatever the strategy
    /// itself reads, sorted and deduplicated.
    pub fn all_ema_periods(&self) -> Vec<usize> {
        let mut periods = self.ema_periods.clone();
        match self.kind {
            StrategyKind::RsiEma200 => periods.push(TREND_EMA_PERIOD),
            StrategyKind::MultiFactor => periods.push(CONFIRMATION_EMA_PERIOD),
            StrategyKind::RsiMacd | StrategyKind::MacdHistogram => {}
        }
        periods.sort_unstable();
        periods.dedup();
        periods
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        let mut indicators = vec![
            IndicatorType::Rsi(self.rsi_period),
            self.macd_type(),
            self.bollinger_type(),
            self.volume_type(),
        ];
        indicators.extend(self.all_ema_periods().into_iter().map(IndicatorType::Ema));
        let mut smas = self.sma_periods.clone();
        smas.sort_unstable();
        smas.dedup();
        indicators.extend(smas.into_iter().map(IndicatorType::Sma));
        indicators
    }
}
