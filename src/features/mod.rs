//! Feature helpers - technical measurements over candle series
//!
//! - Bollinger Bands with %B
//! - Relative volume (current / rolling mean)
//! - Mean relative amplitude of a run of candles

pub mod bollinger;
pub use bollinger::{compute_bands, percent_b, BandSet};

use crate::types::Candle;

/// Volume of the last candle divided by the mean volume of the last
/// `lookback` candles (the last one included).
pub fn relative_volume(candles: &[Candle], lookback: usize) -> Option<f64> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }

    let current_volume = candles.last()?.volume;
    let avg_volume: f64 = candles
        .iter()
        .rev()
        .take(lookback)
        .map(|c| c.volume)
        .sum::<f64>()
        / lookback as f64;

    if avg_volume > 0.0 {
        Some(current_volume / avg_volume)
    } else {
        None
    }
}

/// Mean of (high - low) / open over `candles`
pub fn mean_amplitude(candles: &[Candle]) -> Option<f64> {
    if candles.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for c in candles {
        sum += c.amplitude()?;
    }
    Some(sum / candles.len() as f64)
}
