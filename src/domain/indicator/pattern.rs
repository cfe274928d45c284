//! Single-candle patterns and price levels used by opportunity detection.

use crate::domain::candle::Candle;

pub const DOJI_BODY_RATIO: f64 = 0.1;
pub const SUPPORT_LOOKBACK: usize = 50;

/// Body no larger than a tenth of the candle's range.
pub fn is_doji(candle: &Candle) -> bool {
    candle.body() <= DOJI_BODY_RATIO * candle.range()
}

/// Lowest low over the trailing `lookback` candles.
pub fn support_level(candles: &[Candle], lookback: usize) -> Option<f64> {
    let start = candles.len().saturating_sub(lookback);
    candles[start..].iter().map(|c| c.low).reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        let t = DateTime::from_timestamp_millis(0).unwrap();
        Candle {
            open_time: t,
            close_time: t,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn doji_small_body() {
        assert!(is_doji(&candle(100.0, 110.0, 90.0, 101.0)));
        assert!(is_doji(&candle(100.0, 110.0, 90.0, 102.0)));
        assert!(!is_doji(&candle(100.0, 110.0, 90.0, 105.0)));
    }

    #[test]
    fn support_uses_trailing_window() {
        let candles = vec![
            candle(10.0, 12.0, 5.0, 11.0),
            candle(10.0, 12.0, 8.0, 11.0),
            candle(10.0, 12.0, 9.0, 11.0),
        ];
        assert_eq!(support_level(&candles, 50), Some(5.0));
        assert_eq!(support_level(&candles, 2), Some(8.0));
    }

    #[test]
    fn support_empty() {
        assert_eq!(support_level(&[], SUPPORT_LOOKBACK), None);
    }
}
