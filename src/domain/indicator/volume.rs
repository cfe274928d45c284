//! Rolling volume statistics and spike detection.
//!
//! For candle i the average covers candles [0..=i] when the window is 0,
//! otherwise the trailing `window` candles. A windowed average has no value
//! until `window` candles exist. Only candles up to i are ever read.

use crate::domain::candle::CandleSeries;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, VolumeStats};

pub const DEFAULT_SPIKE_THRESHOLD: f64 = 1.5;

pub fn volume_stats(volumes: &[f64], window: usize) -> Vec<Option<VolumeStats>> {
    let mut running = 0.0;
    volumes
        .iter()
        .enumerate()
        .map(|(i, &latest)| {
            if window == 0 {
                running += latest;
                Some(VolumeStats {
                    average: running / (i + 1) as f64,
                    latest,
                })
            } else if i + 1 >= window {
                let slice = &volumes[i + 1 - window..=i];
                Some(VolumeStats {
                    average: slice.iter().sum::<f64>() / window as f64,
                    latest,
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn calculate_volume(series: &CandleSeries, window: usize) -> IndicatorSeries {
    let aligned = volume_stats(&series.volumes(), window)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Volume))
        .collect();
    IndicatorSeries::from_aligned(IndicatorType::Volume { window }, series, aligned)
}

/// `latest > threshold × average`
pub fn is_volume_spike(latest: f64, average: f64, threshold: f64) -> bool {
    latest > threshold * average
}
