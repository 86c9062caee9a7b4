//! Reversal Strategy - multi-timeframe detection pipeline
//!
//! Per instrument and poll cycle:
//! 1. fetch context (1h) and entry (5m) candles
//! 2. Bollinger Bands on the entry series
//! 3. reversal zone on the last closed context candle
//! 4. band touch + consolidation on the last closed entry candle
//! 5. confirmation when both agree on direction
//!
//! Every step degrades to "no signal this cycle"; only the fetch can fail.

pub mod confirm;
pub mod context;
pub mod entry;

pub use confirm::{risk_percent, SignalConfirmer};
pub use context::ContextDetector;
pub use entry::EntryDetector;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::{AppConfig, BandsConfig};
use crate::error::BotError;
use crate::features::compute_bands;
use crate::oracle::CandleSource;
use crate::types::{Candle, CandleSeriesExt, Signal, Timeframe};

#[derive(Debug, Clone)]
pub struct ReversalStrategy {
    bands: BandsConfig,
    context: ContextDetector,
    entry: EntryDetector,
    confirmer: SignalConfirmer,
    context_timeframe: Timeframe,
    entry_timeframe: Timeframe,
    candle_limit: usize,
}

impl ReversalStrategy {
    pub fn new(
        bands: BandsConfig,
        context: ContextDetector,
        entry: EntryDetector,
        confirmer: SignalConfirmer,
        context_timeframe: Timeframe,
        entry_timeframe: Timeframe,
        candle_limit: usize,
    ) -> Self {
        Self {
            bands,
            context,
            entry,
            confirmer,
            context_timeframe,
            entry_timeframe,
            candle_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        let context_timeframe = config.bot.context_timeframe()?;
        let entry_timeframe = config.bot.entry_timeframe()?;

        Ok(Self::new(
            config.bands,
            ContextDetector::new(config.context),
            EntryDetector::new(config.entry),
            SignalConfirmer::new(config.confirm, context_timeframe, entry_timeframe),
            context_timeframe,
            entry_timeframe,
            config.bot.candle_limit,
        ))
    }

    pub fn context_timeframe(&self) -> Timeframe {
        self.context_timeframe
    }

    pub fn entry_timeframe(&self) -> Timeframe {
        self.entry_timeframe
    }

    /// Run detection on one snapshot of both series. Pure apart from logs.
    pub fn analyze(
        &self,
        instrument: &str,
        context_candles: &[Candle],
        entry_candles: &[Candle],
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        let bands = match compute_bands(entry_candles, self.bands.period, self.bands.multiplier) {
            Ok(bands) => bands,
            Err(e) if e.is_expected() => {
                debug!(instrument, error = %e, "Bands not available yet");
                return None;
            }
            Err(e) => {
                warn!(instrument, error = %e, "⚠️ Band computation failed");
                return None;
            }
        };

        let closed_context = context_candles.closed(now.timestamp_millis());
        let Some(zone) = self.context.detect(closed_context) else {
            debug!(instrument, "ℹ️ No reversal context on {}", self.context_timeframe);
            return None;
        };

        let Some(event) = self.entry.detect(entry_candles, &bands) else {
            debug!(instrument, "ℹ️ No consolidation on {}", self.entry_timeframe);
            return None;
        };

        self.confirmer
            .confirm(instrument, Some(&zone), Some(&event), now)
    }

    /// Fetch both series for `instrument` and analyze them. `Ok(None)`
    /// covers empty data and every "no signal" outcome.
    pub async fn evaluate(
        &self,
        source: &dyn CandleSource,
        instrument: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Signal>, BotError> {
        let context_candles = source
            .fetch_candles(instrument, self.context_timeframe, self.candle_limit)
            .await
            .map_err(|e| BotError::Network(format!("{e:#}")))?;
        if context_candles.is_empty() {
            warn!(instrument, timeframe = %self.context_timeframe, "⚠️ No candles returned");
            return Ok(None);
        }

        let entry_candles = source
            .fetch_candles(instrument, self.entry_timeframe, self.candle_limit)
            .await
            .map_err(|e| BotError::Network(format!("{e:#}")))?;
        if entry_candles.is_empty() {
            warn!(instrument, timeframe = %self.entry_timeframe, "⚠️ No candles returned");
            return Ok(None);
        }

        Ok(self.analyze(instrument, &context_candles, &entry_candles, now))
    }
}

impl Default for ReversalStrategy {
    fn default() -> Self {
        Self::new(
            BandsConfig::default(),
            ContextDetector::default(),
            EntryDetector::default(),
            SignalConfirmer::default(),
            Timeframe::Hour1,
            Timeframe::Min5,
            50,
        )
    }
}
