//! Trade records and the append-only ledger.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeKind {
    Buy,
    Sell { profit: f64, profit_pct: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub kind: TradeKind,
    pub candle_index: usize,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub quantity: f64,
    /// Cash balance right after the trade (0 after a buy).
    pub balance_after: f64,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        matches!(self.kind, TradeKind::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self.kind, TradeKind::Sell { .. })
    }

    pub fn profit(&self) -> Option<f64> {
        match self.kind {
            TradeKind::Sell { profit, .. } => Some(profit),
            TradeKind::Buy => None,
        }
    }

    pub fn profit_pct(&self) -> Option<f64> {
        match self.kind {
            TradeKind::Sell { profit_pct, .. } => Some(profit_pct),
            TradeKind::Buy => None,
        }
    }

    /// Capital the account holds after this trade: the cash after a sell, or
    /// the cash committed to the position after a buy.
    pub fn realized_balance(&self) -> f64 {
        match self.kind {
            TradeKind::Buy => self.quantity * self.price,
            TradeKind::Sell { .. } => self.balance_after,
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "BUY"),
            TradeKind::Sell { .. } => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBalance {
    /// First day of the calendar month (UTC).
    pub month: NaiveDate,
    pub balance: f64,
}

impl MonthlyBalance {
    /// e.g. "January 2024"
    pub fn label(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}

fn month_start(date: DateTime<Utc>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn sells(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_sell())
    }

    /// Sum of realised profit over every sell.
    pub fn total_profit(&self) -> f64 {
        self.trades.iter().filter_map(|t| t.profit()).sum()
    }

    /// Realized balance after the last trade, or `initial_balance` if nothing
    /// traded.
    pub fn final_balance(&self, initial_balance: f64) -> f64 {
        self.trades
            .last()
            .map_or(initial_balance, Trade::realized_balance)
    }

    /// Closing balance per calendar month, from the first traded month to the
    /// last. A month without trades carries the previous month's balance.
    pub fn monthly_balances(&self) -> Vec<MonthlyBalance> {
        let mut result: Vec<MonthlyBalance> = Vec::new();
        let mut current: Option<MonthlyBalance> = None;

        for trade in &self.trades {
            let Some(month) = month_start(trade.date) else {
                continue;
            };

            if let Some(open) = current.take() {
                if open.month != month {
                    let carried = open.balance;
                    let mut next = open.month.checked_add_months(Months::new(1));
                    result.push(open);
                    while let Some(gap) = next.filter(|m| *m < month) {
                        result.push(MonthlyBalance {
                            month: gap,
                            balance: carried,
                        });
                        next = gap.checked_add_months(Months::new(1));
                    }
                } else {
                    current = Some(open);
                }
            }

            let balance = trade.realized_balance();
            match current.as_mut() {
                Some(open) => open.balance = balance,
                None => current = Some(MonthlyBalance { month, balance }),
            }
        }

        result.extend(current);
        result
    }
}
