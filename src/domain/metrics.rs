//! Round-trip trade statistics.

use chrono::{DateTime, Utc};

use super::ledger::{TradeKind, TradeLedger};

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub round_trips: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Mean time between entry and exit, in hours.
    pub avg_holding_hours: f64,
    /// Realized balance relative to the initial balance, as a fraction.
    pub total_return: f64,
}

impl TradeStats {
    pub fn compute(ledger: &TradeLedger, initial_balance: f64) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_secs = 0i64;
        let mut entry: Option<DateTime<Utc>> = None;

        for trade in ledger.trades() {
            let profit = match trade.kind {
                TradeKind::Buy => {
                    entry = Some(trade.date);
                    continue;
                }
                TradeKind::Sell { profit, .. } => profit,
            };

            if profit > 0.0 {
                trades_won += 1;
                total_wins += profit;
                largest_win = largest_win.max(profit);
            } else if profit < 0.0 {
                trades_lost += 1;
                total_losses += profit.abs();
                largest_loss = largest_loss.max(profit.abs());
            } else {
                trades_breakeven += 1;
            }

            if let Some(opened) = entry.take() {
                total_holding_secs += (trade.date - opened).num_seconds();
            }
        }

        let round_trips = trades_won + trades_lost + trades_breakeven;
        let win_rate = if round_trips > 0 {
            trades_won as f64 / round_trips as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_holding_hours = if round_trips > 0 {
            total_holding_secs as f64 / 3600.0 / round_trips as f64
        } else {
            0.0
        };

        let total_return = if initial_balance > 0.0 {
            (ledger.final_balance(initial_balance) - initial_balance) / initial_balance
        } else {
            0.0
        };

        TradeStats {
            round_trips,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            largest_win,
            largest_loss,
            avg_holding_hours,
            total_return,
        }
    }
}
