#![allow(dead_code)]

use candletrader::domain::backtest::{BacktestConfig, BacktestResult};
use candletrader::domain::candle::{Candle, CandleSeries, RawCandle};
use candletrader::domain::error::TraderError;
use candletrader::domain::strategy::StrategyConfig;
use candletrader::ports::data_port::DataPort;
use candletrader::ports::report_port::ReportPort;
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::io::Write;

/// 2024-01-01T00:00:00Z
pub const START_MS: i64 = 1_704_067_200_000;

pub const SCENARIO_CLOSES: [f64; 10] =
    [100.0, 95.0, 90.0, 85.0, 92.0, 98.0, 105.0, 110.0, 100.0, 95.0];

pub struct MockDataPort {
    pub candles: Vec<RawCandle>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(candles: Vec<RawCandle>) -> Self {
        Self {
            candles,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            candles: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self) -> Result<Vec<RawCandle>, TraderError> {
        match &self.error {
            Some(reason) => Err(TraderError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.candles.clone()),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(BacktestResult, BacktestConfig)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, result: &BacktestResult, config: &BacktestConfig) -> Result<(), TraderError> {
        self.calls
            .borrow_mut()
            .push((result.clone(), config.clone()));
        Ok(())
    }
}

pub fn open_time(index: usize, step: Duration) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(START_MS).unwrap() + step * index as i32
}

/// Candle with flat OHLC at `close`.
pub fn make_candle(index: usize, step: Duration, close: f64) -> Candle {
    let open_time = open_time(index, step);
    Candle {
        open_time,
        close_time: open_time + step - Duration::milliseconds(1),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

pub fn series_from_closes(closes: &[f64]) -> CandleSeries {
    series_with_step(closes, Duration::minutes(1))
}

pub fn series_with_step(closes: &[f64], step: Duration) -> CandleSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i, step, c))
        .collect();
    let (series, rejected) = CandleSeries::from_candles(candles);
    assert!(rejected.is_empty());
    series
}

/// Raw exchange-style record, timestamps as epoch milliseconds.
pub fn make_raw(index: usize, close: f64) -> RawCandle {
    let candle = make_candle(index, Duration::minutes(1), close);
    RawCandle {
        open_time: candle.open_time.timestamp_millis().to_string(),
        close_time: candle.close_time.timestamp_millis().to_string(),
        open: close.to_string(),
        high: close.to_string(),
        low: close.to_string(),
        close: close.to_string(),
        volume: "1000".to_string(),
    }
}

pub fn raws_from_closes(closes: &[f64]) -> Vec<RawCandle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_raw(i, c))
        .collect()
}

pub fn csv_content(raws: &[RawCandle]) -> String {
    let mut out = String::from("open_time,close_time,open,high,low,close,volume\n");
    for r in raws {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.open_time, r.close_time, r.open, r.high, r.low, r.close, r.volume
        ));
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Short periods so a handful of candles clear every warm-up.
pub fn toy_config() -> BacktestConfig {
    BacktestConfig {
        initial_balance: 1000.0,
        strategy: StrategyConfig {
            rsi_period: 3,
            macd_fast: 2,
            macd_slow: 4,
            macd_signal: 2,
            bollinger_period: 3,
            ema_periods: vec![2, 3],
            ..StrategyConfig::default()
        },
    }
}

pub const TOY_INI: &str = r#"
[backtest]
initial_balance = 1000

[strategy]
kind = RSI+MACD
rsi_period = 3
macd_fast = 2
macd_slow = 4
macd_signal = 2
bollinger_period = 3
ema_periods = 2,3
"#;
