//! Higher-timeframe context - reversal zones backed by a volume surge
//!
//! Looks only at the last closed candle against the one before it:
//! - Resistance: new high beyond the previous high, close pulled back off
//!   the high, volume above the rolling baseline.
//! - Support: the mirror image on the lows.
//!
//! Callers pass closed candles only; an in-progress candle at the tail
//! would be classified as if it had closed.

use tracing::{debug, info};

use crate::config::ContextConfig;
use crate::features::relative_volume;
use crate::types::{Candle, ContextZone, ZoneKind};

#[derive(Debug, Clone)]
pub struct ContextDetector {
    config: ContextConfig,
}

impl ContextDetector {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Classify the last candle of `candles` as a resistance zone, a
    /// support zone, or nothing. Resistance is tested first.
    pub fn detect(&self, candles: &[Candle]) -> Option<ContextZone> {
        let cfg = &self.config;
        if candles.len() < cfg.min_candles.max(2) {
            debug!(
                available = candles.len(),
                required = cfg.min_candles,
                "Context detector warming up"
            );
            return None;
        }

        let current = &candles[candles.len() - 1];
        let previous = &candles[candles.len() - 2];

        let volume_strength = relative_volume(candles, cfg.volume_lookback)?;
        let surge = volume_strength > cfg.volume_surge;
        let pct = cfg.extremum_break_pct;

        if surge
            && current.high > previous.high * (1.0 + pct)
            && current.close < current.high * (1.0 - pct)
        {
            info!(
                zone_price = current.high,
                close = current.close,
                volume_strength,
                "🔍 Resistance zone detected"
            );
            return Some(ContextZone {
                kind: ZoneKind::Resistance,
                zone_price: current.high,
                current_close: current.close,
                volume_strength,
                timestamp: current.open_time,
            });
        }

        if surge
            && current.low < previous.low * (1.0 - pct)
            && current.close > current.low * (1.0 + pct)
        {
            info!(
                zone_price = current.low,
                close = current.close,
                volume_strength,
                "🔍 Support zone detected"
            );
            return Some(ContextZone {
                kind: ZoneKind::Support,
                zone_price: current.low,
                current_close: current.close,
                volume_strength,
                timestamp: current.open_time,
            });
        }

        None
    }
}

impl Default for ContextDetector {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}
