//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod indicator_engine;
pub mod ledger;
pub mod metrics;
pub mod position;
pub mod signal;
pub mod strategy;
