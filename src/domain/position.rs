//! Simulation state: cash balance plus a single flat-or-long position.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Flat,
    Long {
        quantity: f64,
        entry_price: f64,
        entry_date: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash_balance: f64,
    pub position: Position,
    /// Set when an indicator exit was suppressed because it would realise a loss.
    pub waiting_for_profitable_exit: bool,
}

impl SimulationState {
    pub fn new(initial_balance: f64) -> Self {
        SimulationState {
            cash_balance: initial_balance,
            position: Position::Flat,
            waiting_for_profitable_exit: false,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self.position, Position::Long { .. })
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.position, Position::Flat)
    }

    pub fn asset_quantity(&self) -> f64 {
        match self.position {
            Position::Long { quantity, .. } => quantity,
            Position::Flat => 0.0,
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self.position {
            Position::Long { entry_price, .. } => Some(entry_price),
            Position::Flat => None,
        }
    }

    pub fn entry_date(&self) -> Option<DateTime<Utc>> {
        match self.position {
            Position::Long { entry_date, .. } => Some(entry_date),
            Position::Flat => None,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.asset_quantity() * price
    }

    /// Cash plus the position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash_balance + self.market_value(price)
    }

    /// (price - entry) / entry × 100 while long.
    pub fn unrealized_pct(&self, price: f64) -> Option<f64> {
        self.entry_price()
            .map(|entry| (price - entry) / entry * 100.0)
    }
}
