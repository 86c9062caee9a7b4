//! Bollinger Bands - rolling mean ± k population standard deviations
//!
//! Band index `i` lines up with close `i + period - 1` of the input series;
//! the first `period - 1` closes have no band value.

use crate::error::BotError;
use crate::types::Candle;

/// Relative band width below which a window counts as zero variance
const ZERO_WIDTH_TOLERANCE: f64 = 1e-12;

/// Parallel band sequences for one series
#[derive(Debug, Clone, PartialEq)]
pub struct BandSet {
    pub period: usize,
    pub multiplier: f64,
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    /// `None` where the band has zero width
    pub percent_b: Vec<Option<f64>>,
}

impl BandSet {
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    /// %B counted from the end, `offset = 1` is the newest band value
    pub fn percent_b_from_end(&self, offset: usize) -> Option<f64> {
        if offset == 0 || offset > self.percent_b.len() {
            return None;
        }
        self.percent_b[self.percent_b.len() - offset]
    }

    /// Position in the input series that band index `band_idx` belongs to
    pub fn series_index(&self, band_idx: usize) -> usize {
        band_idx + self.period - 1
    }
}

/// Normalized position of `close` inside the band, 0 = lower, 1 = upper
pub fn percent_b(close: f64, upper: f64, lower: f64) -> Option<f64> {
    let width = upper - lower;
    let scale = upper.abs().max(lower.abs()).max(1.0);
    if !width.is_finite() || width.abs() <= ZERO_WIDTH_TOLERANCE * scale {
        return None;
    }
    Some((close - lower) / width)
}

/// Compute bands over every close of `candles`, the in-progress last
/// candle included. Windowing is the caller's concern.
pub fn compute_bands(
    candles: &[Candle],
    period: usize,
    multiplier: f64,
) -> Result<BandSet, BotError> {
    if period == 0 || candles.len() < period {
        return Err(BotError::InsufficientData {
            required: period.max(1),
            available: candles.len(),
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let count = closes.len() - period + 1;

    let mut bands = BandSet {
        period,
        multiplier,
        middle: Vec::with_capacity(count),
        upper: Vec::with_capacity(count),
        lower: Vec::with_capacity(count),
        percent_b: Vec::with_capacity(count),
    };

    for window in closes.windows(period) {
        let sma = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        let upper = sma + multiplier * std;
        let lower = sma - multiplier * std;
        let close = window[period - 1];

        bands.middle.push(sma);
        bands.upper.push(upper);
        bands.lower.push(lower);
        bands.percent_b.push(percent_b(close, upper, lower));
    }

    Ok(bands)
}
