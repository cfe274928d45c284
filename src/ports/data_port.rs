//! Candle source port trait.

use crate::domain::candle::RawCandle;
use crate::domain::error::TraderError;

/// Yields raw candle records in the order the source stores them. Parsing
/// and validation happen during ingestion, not in the source.
pub trait DataPort {
    fn fetch_candles(&self) -> Result<Vec<RawCandle>, TraderError>;

    /// Human-readable origin used in log and error messages.
    fn describe(&self) -> String;
}
