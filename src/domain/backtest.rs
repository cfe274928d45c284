//! Walk-forward backtest driver.
//!
//! Candles are visited once, in ascending order. Indicators are computed up
//! front over the whole series; every indicator is causal so the sample for
//! candle `i` only reflects candles `0..=i`.

use tracing::info;

use crate::domain::candle::CandleSeries;
use crate::domain::config_validation::validate_config;
use crate::domain::error::TraderError;
use crate::domain::execution;
use crate::domain::indicator_engine::{compute_indicators, IndicatorSample};
use crate::domain::ledger::TradeLedger;
use crate::domain::position::SimulationState;
use crate::domain::signal::{self, Signal};
use crate::domain::strategy::StrategyConfig;

pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub strategy: StrategyConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            strategy: StrategyConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    pub final_state: SimulationState,
    /// One sample per processed candle, in candle order.
    pub samples: Vec<IndicatorSample>,
    pub candles_processed: usize,
}

impl BacktestResult {
    /// Cash plus any open position marked at the last close.
    pub fn final_equity(&self) -> f64 {
        let last_close = self.samples.last().map_or(0.0, |s| s.close);
        self.final_state.equity(last_close)
    }
}

pub fn run_backtest(
    series: &CandleSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, TraderError> {
    validate_config(config)?;

    let strategy = &config.strategy;
    info!(
        candles = series.len(),
        strategy = %strategy.kind,
        initial_balance = config.initial_balance,
        "starting backtest"
    );

    let indicators = compute_indicators(series, &strategy.required_indicators());

    let mut state = SimulationState::new(config.initial_balance);
    let mut ledger = TradeLedger::new();
    let mut samples = Vec::with_capacity(series.len());

    for (index, candle) in series.candles().iter().enumerate() {
        let Some(sample) = indicators.sample(series, index, strategy) else {
            continue;
        };

        let proposed = signal::apply_take_profit(
            signal::evaluate(&sample, state.is_long(), strategy),
            sample.close,
            state.entry_price(),
            strategy,
        );
        let outcome = execution::step(state, index, candle, proposed, strategy.profit_cap_pct);
        state = outcome.state;
        if let Some(trade) = outcome.trade {
            ledger.record(trade);
        }
        samples.push(sample);
    }

    info!(
        trades = ledger.len(),
        cash_balance = state.cash_balance,
        long = state.is_long(),
        total_profit = ledger.total_profit(),
        "backtest finished"
    );

    Ok(BacktestResult {
        ledger,
        final_state: state,
        candles_processed: samples.len(),
        samples,
    })
}

/// Signal for candle `index` evaluated from a flat position, using only the
/// indicators computed over `series`. HOLD when `index` is out of range.
pub fn signal_at(series: &CandleSeries, config: &StrategyConfig, index: usize) -> Signal {
    let indicators = compute_indicators(series, &config.required_indicators());
    indicators
        .sample(series, index, config)
        .map_or(Signal::Hold, |sample| signal::evaluate(&sample, false, config))
}
