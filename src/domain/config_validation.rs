//! Configuration loading and validation.
//!
//! Everything is checked before the first candle is processed; a run either
//! starts with a valid configuration or does not start at all.

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_BALANCE};
use crate::domain::error::TraderError;
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &BacktestConfig) -> Result<(), TraderError> {
    validate_initial_balance(config.initial_balance)?;
    validate_strategy(&config.strategy)?;
    Ok(())
}

fn validate_initial_balance(value: f64) -> Result<(), TraderError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TraderError::invalid(
            "backtest",
            "initial_balance",
            "initial_balance must be positive",
        ));
    }
    Ok(())
}

pub fn validate_strategy(strategy: &StrategyConfig) -> Result<(), TraderError> {
    validate_period("rsi_period", strategy.rsi_period)?;
    validate_period("macd_fast", strategy.macd_fast)?;
    validate_period("macd_slow", strategy.macd_slow)?;
    validate_period("macd_signal", strategy.macd_signal)?;
    validate_period("bollinger_period", strategy.bollinger_period)?;
    for &p in &strategy.ema_periods {
        validate_period("ema_periods", p)?;
    }
    for &p in &strategy.sma_periods {
        validate_period("sma_periods", p)?;
    }

    if strategy.macd_slow <= strategy.macd_fast {
        return Err(TraderError::invalid(
            "strategy",
            "macd_slow",
            format!(
                "macd_slow ({}) must be greater than macd_fast ({})",
                strategy.macd_slow, strategy.macd_fast
            ),
        ));
    }

    if !strategy.bollinger_stddev.is_finite() || strategy.bollinger_stddev <= 0.0 {
        return Err(TraderError::invalid(
            "strategy",
            "bollinger_stddev",
            "bollinger_stddev must be positive",
        ));
    }

    validate_threshold("rsi_buy_threshold", strategy.rsi_buy_threshold)?;
    validate_threshold("rsi_sell_threshold", strategy.rsi_sell_threshold)?;
    validate_threshold("opportunity_rsi_max", strategy.opportunity_rsi_max)?;
    validate_threshold("histogram_exit_rsi_max", strategy.histogram_exit_rsi_max)?;

    if let Some(pct) = strategy.take_profit_pct {
        if !pct.is_finite() || pct <= 0.0 {
            return Err(TraderError::invalid(
                "strategy",
                "take_profit_pct",
                "take_profit_pct must be positive",
            ));
        }
    }

    if !strategy.profit_cap_pct.is_finite() || strategy.profit_cap_pct < 0.0 {
        return Err(TraderError::invalid(
            "strategy",
            "profit_cap_pct",
            "profit_cap_pct must be non-negative",
        ));
    }

    if !strategy.volume_spike_threshold.is_finite() || strategy.volume_spike_threshold <= 0.0 {
        return Err(TraderError::invalid(
            "strategy",
            "volume_spike_threshold",
            "volume_spike_threshold must be positive",
        ));
    }

    Ok(())
}

fn validate_period(key: &str, value: usize) -> Result<(), TraderError> {
    if value == 0 {
        return Err(TraderError::invalid(
            "strategy",
            key,
            format!("{key} must be greater than 0"),
        ));
    }
    Ok(())
}

fn validate_threshold(key: &str, value: f64) -> Result<(), TraderError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(TraderError::invalid(
            "strategy",
            key,
            format!("{key} must be between 0 and 100"),
        ));
    }
    Ok(())
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TraderError::invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            TraderError::invalid(section, key, format!("'{raw}' is not a non-negative integer"))
        }),
    }
}

fn read_periods(
    config: &dyn ConfigPort,
    key: &str,
    default: &[usize],
) -> Result<Vec<usize>, TraderError> {
    match config.get_list("strategy", key) {
        None => Ok(default.to_vec()),
        Some(items) => items
            .iter()
            .map(|item| {
                item.parse().map_err(|_| {
                    TraderError::invalid("strategy", key, format!("'{item}' is not a period"))
                })
            })
            .collect(),
    }
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, TraderError> {
    let kind = match config.get_string("strategy", "kind") {
        Some(name) => name
            .parse::<StrategyKind>()
            .map_err(|reason| TraderError::invalid("strategy", "kind", reason))?,
        None => StrategyKind::default(),
    };
    let d = StrategyConfig::with_kind(kind);

    Ok(StrategyConfig {
        kind,
        rsi_period: read_usize(config, "strategy", "rsi_period", d.rsi_period)?,
        macd_fast: read_usize(config, "strategy", "macd_fast", d.macd_fast)?,
        macd_slow: read_usize(config, "strategy", "macd_slow", d.macd_slow)?,
        macd_signal: read_usize(config, "strategy", "macd_signal", d.macd_signal)?,
        bollinger_period: read_usize(config, "strategy", "bollinger_period", d.bollinger_period)?,
        bollinger_stddev: read_f64(config, "strategy", "bollinger_stddev", d.bollinger_stddev)?,
        ema_periods: read_periods(config, "ema_periods", &d.ema_periods)?,
        sma_periods: read_periods(config, "sma_periods", &d.sma_periods)?,
        rsi_buy_threshold: read_f64(config, "strategy", "rsi_buy_threshold", d.rsi_buy_threshold)?,
        rsi_sell_threshold: read_f64(
            config,
            "strategy",
            "rsi_sell_threshold",
            d.rsi_sell_threshold,
        )?,
        profit_cap_pct: read_f64(config, "strategy", "profit_cap_pct", d.profit_cap_pct)?,
        opportunity_rsi_max: read_f64(
            config,
            "strategy",
            "opportunity_rsi_max",
            d.opportunity_rsi_max,
        )?,
        volume_window: read_usize(config, "strategy", "volume_window", d.volume_window)?,
        volume_spike_threshold: read_f64(
            config,
            "strategy",
            "volume_spike_threshold",
            d.volume_spike_threshold,
        )?,
        histogram_exit_rsi_max: read_f64(
            config,
            "strategy",
            "histogram_exit_rsi_max",
            d.histogram_exit_rsi_max,
        )?,
        take_profit_pct: match config.get_string("strategy", "take_profit_pct") {
            None => None,
            Some(_) => Some(read_f64(config, "strategy", "take_profit_pct", 0.0)?),
        },
    })
}

/// Parse and validate the `[backtest]` and `[strategy]` sections.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    let bt = BacktestConfig {
        initial_balance: read_f64(config, "backtest", "initial_balance", DEFAULT_INITIAL_BALANCE)?,
        strategy: build_strategy_config(config)?,
    };
    validate_config(&bt)?;
    Ok(bt)
}

/// Candle file named by `[backtest] data`, if any.
pub fn data_path(config: &dyn ConfigPort) -> Option<String> {
    config
        .get_string("backtest", "data")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
