//! Lower-timeframe entry - band touch followed by consolidation
//!
//! The last element of the series is the in-progress candle and is never
//! read. The latest closed candle sits at index `len - 2`, and its %B is
//! read at the same offset from the end of the band sequence.

use tracing::{debug, info};

use crate::config::EntryConfig;
use crate::error::BotError;
use crate::features::{mean_amplitude, BandSet};
use crate::types::{Candle, EntryEvent, EntryKind};

#[derive(Debug, Clone)]
pub struct EntryDetector {
    config: EntryConfig,
}

impl EntryDetector {
    pub fn new(config: EntryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }

    /// Classify the latest closed candle as an upper or lower band
    /// touch-then-consolidate event. `bands` must come from `candles`.
    pub fn detect(&self, candles: &[Candle], bands: &BandSet) -> Option<EntryEvent> {
        let cfg = &self.config;
        let window = cfg.consolidation_candles.max(1);
        if candles.len() < cfg.min_candles.max(window + 1) || bands.is_empty() {
            debug!(
                available = candles.len(),
                required = cfg.min_candles,
                "Entry detector warming up"
            );
            return None;
        }
        if bands.len() + bands.period - 1 != candles.len() {
            debug!(
                candles = candles.len(),
                bands = bands.len(),
                period = bands.period,
                "Band set does not line up with the series"
            );
            return None;
        }

        let Some(percent_b) = bands.percent_b_from_end(2) else {
            debug!(reason = %BotError::UndefinedMetric, "No %B for the latest closed candle");
            return None;
        };

        let last_closed_idx = candles.len() - 2;
        let latest = &candles[last_closed_idx];
        let consolidation = &candles[last_closed_idx + 1 - window..=last_closed_idx];
        let mean_amplitude = mean_amplitude(consolidation)?;

        if mean_amplitude >= cfg.max_amplitude {
            return None;
        }

        let kind = if percent_b > cfg.upper_touch {
            EntryKind::TouchUpper
        } else if percent_b < cfg.lower_touch {
            EntryKind::TouchLower
        } else {
            return None;
        };

        info!(
            kind = %kind,
            percent_b,
            mean_amplitude,
            close = latest.close,
            "📊 Consolidation after band touch"
        );

        Some(EntryEvent {
            kind,
            percent_b,
            mean_amplitude,
            current_close: latest.close,
            timestamp: latest.open_time,
        })
    }
}

impl Default for EntryDetector {
    fn default() -> Self {
        Self::new(EntryConfig::default())
    }
}
