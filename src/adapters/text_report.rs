//! Plain-text report adapter implementing ReportPort.
//!
//! Renders the trade log, optional per-candle diagnostics, the run summary
//! and the monthly balance report. Output goes to a file when a path is
//! configured, otherwise to stdout.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use chrono::SecondsFormat;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::TraderError;
use crate::domain::indicator_engine::IndicatorSample;
use crate::domain::ledger::{Trade, TradeKind};
use crate::domain::metrics::TradeStats;
use crate::ports::report_port::ReportPort;

fn or_null(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

pub fn format_trade(trade: &Trade) -> String {
    let date = trade.date.to_rfc3339_opts(SecondsFormat::Secs, true);
    match trade.kind {
        TradeKind::Buy => format!(
            "#{} {} BUY  price={:.2} qty={:.8} balance={:.2}",
            trade.candle_index, date, trade.price, trade.quantity, trade.balance_after
        ),
        TradeKind::Sell { profit, profit_pct } => format!(
            "#{} {} SELL price={:.2} qty={:.8} balance={:.2} profit={:.2} ({:.2}%)",
            trade.candle_index,
            date,
            trade.price,
            trade.quantity,
            trade.balance_after,
            profit,
            profit_pct
        ),
    }
}

/// One diagnostic line per candle. Indicators still warming up print `null`.
pub fn format_diagnostic(sample: &IndicatorSample) -> String {
    format!(
        "Candle {} {}: Fechamento = {}, RSI = {}, Histograma = {}, MACD = {}, Sinal = {}, EMA9 = {}, EMA21 = {}, EMA200 = {}",
        sample.index,
        sample.time.to_rfc3339_opts(SecondsFormat::Millis, true),
        sample.close,
        or_null(sample.rsi),
        or_null(sample.macd_histogram()),
        or_null(sample.macd_line()),
        or_null(sample.macd_signal()),
        or_null(sample.ema(9)),
        or_null(sample.ema(21)),
        or_null(sample.ema(200)),
    )
}

pub fn format_summary(result: &BacktestResult, config: &BacktestConfig) -> String {
    let stats = TradeStats::compute(&result.ledger, config.initial_balance);
    let state = &result.final_state;
    let mut out = String::new();

    let _ = writeln!(out, "=== Summary ===");
    let _ = writeln!(out, "Strategy:         {}", config.strategy.kind);
    let _ = writeln!(out, "Candles:          {}", result.candles_processed);
    let _ = writeln!(out, "Trades:           {}", result.ledger.len());
    let _ = writeln!(out, "Initial balance:  {:.2}", config.initial_balance);
    let _ = writeln!(out, "Final balance:    {:.2}", state.cash_balance);
    let _ = writeln!(out, "Total profit:     {:.2}", result.ledger.total_profit());
    match (state.entry_price(), state.entry_date()) {
        (Some(entry), Some(date)) => {
            let _ = writeln!(
                out,
                "Open position:    {:.8} @ {:.2} since {}",
                state.asset_quantity(),
                entry,
                date.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            let _ = writeln!(out, "Marked equity:    {:.2}", result.final_equity());
        }
        _ => {
            let _ = writeln!(out, "Open position:    none");
        }
    }
    let _ = writeln!(out, "Round trips:      {}", stats.round_trips);
    let _ = writeln!(out, "Win rate:         {:.1}%", stats.win_rate * 100.0);
    let _ = writeln!(out, "Profit factor:    {:.2}", stats.profit_factor);
    let _ = writeln!(out, "Avg holding:      {:.1}h", stats.avg_holding_hours);
    let _ = writeln!(out, "Return:           {:.2}%", stats.total_return * 100.0);

    out
}

pub fn format_monthly(result: &BacktestResult) -> String {
    let mut out = String::from("=== Monthly balances ===\n");
    for month in result.ledger.monthly_balances() {
        let _ = writeln!(out, "{}: {:.2}", month.label(), month.balance);
    }
    out
}

pub struct TextReport {
    output: Option<PathBuf>,
    diagnostics: bool,
}

impl TextReport {
    pub fn new(output: Option<PathBuf>, diagnostics: bool) -> Self {
        Self {
            output,
            diagnostics,
        }
    }

    pub fn render(&self, result: &BacktestResult, config: &BacktestConfig) -> String {
        let mut out = String::new();

        if self.diagnostics {
            for sample in &result.samples {
                out.push_str(&format_diagnostic(sample));
                out.push('\n');
            }
            out.push('\n');
        }

        out.push_str("=== Trades ===\n");
        for trade in result.ledger.trades() {
            out.push_str(&format_trade(trade));
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format_summary(result, config));
        out.push('\n');
        out.push_str(&format_monthly(result));
        out
    }
}

impl ReportPort for TextReport {
    fn write(&self, result: &BacktestResult, config: &BacktestConfig) -> Result<(), TraderError> {
        let rendered = self.render(result, config);
        match &self.output {
            Some(path) => fs::write(path, rendered)?,
            None => std::io::stdout().lock().write_all(rendered.as_bytes())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::MacdValue;
    use crate::domain::ledger::TradeLedger;
    use crate::domain::position::SimulationState;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn sample() -> IndicatorSample {
        IndicatorSample {
            index: 30,
            time: DateTime::from_timestamp_millis(1_704_067_200_000).unwrap(),
            close: 42150.5,
            volume: 10.0,
            prev_close: None,
            rsi: Some(48.25),
            prev_rsi: None,
            macd: Some(MacdValue {
                line: 1.5,
                signal: None,
                histogram: None,
            }),
            emas: BTreeMap::from([(9, 42100.0), (21, 42000.0)]),
            smas: BTreeMap::new(),
            bollinger: None,
            volume_stats: None,
        }
    }

    fn result_with(trades: Vec<Trade>, final_state: SimulationState) -> BacktestResult {
        let mut ledger = TradeLedger::new();
        for t in trades {
            ledger.record(t);
        }
        BacktestResult {
            ledger,
            final_state,
            samples: vec![sample()],
            candles_processed: 1,
        }
    }

    fn sell(date: DateTime<Utc>, balance: f64, profit: f64, pct: f64) -> Trade {
        Trade {
            kind: TradeKind::Sell {
                profit,
                profit_pct: pct,
            },
            candle_index: 7,
            date,
            price: 105.0,
            quantity: 10.0,
            balance_after: balance,
        }
    }

    #[test]
    fn diagnostic_line_format() {
        assert_eq!(
            format_diagnostic(&sample()),
            "Candle 30 2024-01-01T00:00:00.000Z: Fechamento = 42150.5, RSI = 48.25, \
             Histograma = null, MACD = 1.5, Sinal = null, EMA9 = 42100, EMA21 = 42000, \
             EMA200 = null"
        );
    }

    #[test]
    fn buy_line() {
        let trade = Trade {
            kind: TradeKind::Buy,
            candle_index: 4,
            date: at(2024, 1, 15),
            price: 100.0,
            quantity: 10.0,
            balance_after: 0.0,
        };
        assert_eq!(
            format_trade(&trade),
            "#4 2024-01-15T00:00:00Z BUY  price=100.00 qty=10.00000000 balance=0.00"
        );
    }

    #[test]
    fn sell_line_keeps_sign() {
        let line = format_trade(&sell(at(2024, 1, 16), 950.0, -50.0, -5.0));
        assert!(line.ends_with("profit=-50.00 (-5.00%)"), "{line}");
    }

    #[test]
    fn monthly_report_lines() {
        let result = result_with(
            vec![
                sell(at(2024, 1, 15), 1000.0, 0.0, 0.0),
                sell(at(2024, 2, 10), 1200.0, 200.0, 20.0),
            ],
            SimulationState::new(1200.0),
        );
        let monthly = format_monthly(&result);
        assert!(monthly.contains("January 2024: 1000.00\n"));
        assert!(monthly.contains("February 2024: 1200.00\n"));
    }

    #[test]
    fn summary_reports_flat_and_long() {
        let config = BacktestConfig::default();
        let flat = result_with(vec![], SimulationState::new(1000.0));
        let text = format_summary(&flat, &config);
        assert!(text.contains("Final balance:    1000.00"));
        assert!(text.contains("Open position:    none"));

        let (long, _) = crate::domain::execution::enter_long(
            &SimulationState::new(1000.0),
            0,
            &crate::domain::candle::Candle {
                open_time: at(2024, 1, 1),
                close_time: at(2024, 1, 2),
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: 1.0,
            },
        )
        .unwrap();
        let text = format_summary(&result_with(vec![], long), &config);
        assert!(text.contains("Open position:    10.00000000 @ 100.00"));
        assert!(text.contains("Marked equity:"));
    }

    #[test]
    fn diagnostics_are_optional() {
        let config = BacktestConfig::default();
        let result = result_with(vec![], SimulationState::new(1000.0));
        assert!(!TextReport::new(None, false).render(&result, &config).contains("Candle 30"));
        assert!(TextReport::new(None, true).render(&result, &config).contains("Candle 30"));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.txt");
        let result = result_with(
            vec![sell(at(2024, 1, 15), 1000.0, 0.0, 0.0)],
            SimulationState::new(1000.0),
        );
        TextReport::new(Some(path.clone()), false)
            .write(&result, &BacktestConfig::default())
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("=== Trades ==="));
        assert!(content.contains("January 2024: 1000.00"));
    }
}
