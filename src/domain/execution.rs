//! Position transitions.
//!
//! The whole cash balance is committed on entry and the whole position is
//! released on exit; there are no fees, slippage or partial fills. Each
//! transition consumes the previous [`SimulationState`] and returns the next
//! one together with the trade it produced, so a step is applied atomically.

use tracing::debug;

use crate::domain::candle::Candle;
use crate::domain::ledger::{Trade, TradeKind};
use crate::domain::position::{Position, SimulationState};
use crate::domain::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: SimulationState,
    pub trade: Option<Trade>,
}

impl StepOutcome {
    fn unchanged(state: SimulationState) -> Self {
        StepOutcome { state, trade: None }
    }
}

/// (price - entry) / entry × 100
pub fn profit_percentage(entry_price: f64, price: f64) -> f64 {
    (price - entry_price) / entry_price * 100.0
}

/// FLAT → LONG at the candle's close. Returns `None` if already long or the
/// balance cannot buy anything.
pub fn enter_long(state: &SimulationState, index: usize, candle: &Candle) -> Option<(SimulationState, Trade)> {
    if state.is_long() || state.cash_balance <= 0.0 {
        return None;
    }

    let price = candle.close;
    let quantity = state.cash_balance / price;

    let next = SimulationState {
        cash_balance: 0.0,
        position: Position::Long {
            quantity,
            entry_price: price,
            entry_date: candle.open_time,
        },
        waiting_for_profitable_exit: false,
    };

    let trade = Trade {
        kind: TradeKind::Buy,
        candle_index: index,
        date: candle.open_time,
        price,
        quantity,
        balance_after: 0.0,
    };

    Some((next, trade))
}

/// LONG → FLAT at the candle's close. Returns `None` if flat.
pub fn exit_long(state: &SimulationState, index: usize, candle: &Candle) -> Option<(SimulationState, Trade)> {
    let Position::Long {
        quantity,
        entry_price,
        ..
    } = state.position
    else {
        return None;
    };

    let price = candle.close;
    let proceeds = quantity * price;
    let profit = (price - entry_price) * quantity;
    let profit_pct = profit_percentage(entry_price, price);

    let next = SimulationState {
        cash_balance: state.cash_balance + proceeds,
        position: Position::Flat,
        waiting_for_profitable_exit: false,
    };

    let trade = Trade {
        kind: TradeKind::Sell { profit, profit_pct },
        candle_index: index,
        date: candle.open_time,
        price,
        quantity,
        balance_after: next.cash_balance,
    };

    Some((next, trade))
}

/// Apply one candle's signal.
///
/// A SELL that would realise a loss is suppressed and marks the state as
/// waiting for a profitable exit; the position is held until a later SELL
/// arrives at or above the entry price.
pub fn step(
    state: SimulationState,
    index: usize,
    candle: &Candle,
    signal: Signal,
    profit_cap_pct: f64,
) -> StepOutcome {
    match signal {
        Signal::Hold => StepOutcome::unchanged(state),
        Signal::Buy => match enter_long(&state, index, candle) {
            Some((next, trade)) => {
                debug!(index, price = trade.price, quantity = trade.quantity, "enter long");
                StepOutcome {
                    state: next,
                    trade: Some(trade),
                }
            }
            None => StepOutcome::unchanged(state),
        },
        Signal::Sell => {
            let Some(pct) = state.unrealized_pct(candle.close) else {
                return StepOutcome::unchanged(state);
            };

            if pct < 0.0 {
                debug!(index, pct, "exit suppressed, waiting for profitable price");
                return StepOutcome::unchanged(SimulationState {
                    waiting_for_profitable_exit: true,
                    ..state
                });
            }

            // Losses returned above, so `pct >= 0` holds here and the cap clause
            // never decides the outcome for a validated candle.
            if pct >= 0.0 || (state.waiting_for_profitable_exit && pct < profit_cap_pct) {
                if let Some((next, trade)) = exit_long(&state, index, candle) {
                    debug!(index, price = trade.price, pct, "exit long");
                    return StepOutcome {
                        state: next,
                        trade: Some(trade),
                    };
                }
            }

            StepOutcome::unchanged(state)
        }
    }
}
