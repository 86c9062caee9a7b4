//! Configuration section types

use serde::Deserialize;

use crate::error::BotError;
use crate::types::Timeframe;

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Exchange symbols to monitor
    pub instruments: Vec<String>,
    /// Minimum seconds between two checks of the same instrument
    pub poll_interval_secs: u64,
    /// Timeframe for reversal zones
    pub context_timeframe: String,
    /// Timeframe for band touches
    pub entry_timeframe: String,
    /// Candles fetched per series
    pub candle_limit: usize,
}

impl BotConfig {
    pub fn context_timeframe(&self) -> Result<Timeframe, BotError> {
        parse_timeframe(&self.context_timeframe)
    }

    pub fn entry_timeframe(&self) -> Result<Timeframe, BotError> {
        parse_timeframe(&self.entry_timeframe)
    }
}

fn parse_timeframe(s: &str) -> Result<Timeframe, BotError> {
    Timeframe::from_str(s).ok_or_else(|| BotError::InvalidConfig(format!("unknown timeframe {s:?}")))
}

/// Bollinger Band parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BandsConfig {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

/// Higher-timeframe reversal zone thresholds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ContextConfig {
    /// Closed candles required before detection runs
    pub min_candles: usize,
    /// Candles in the volume baseline (latest included)
    pub volume_lookback: usize,
    /// Extremum break and close pull-back fraction (0.005 = 0.5%)
    pub extremum_break_pct: f64,
    /// Volume / baseline ratio that counts as a surge
    pub volume_surge: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            min_candles: 25,
            volume_lookback: 20,
            extremum_break_pct: 0.005,
            volume_surge: 1.2,
        }
    }
}

/// Lower-timeframe touch-then-consolidate thresholds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EntryConfig {
    pub min_candles: usize,
    /// Closed candles averaged for the amplitude test
    pub consolidation_candles: usize,
    /// Mean (high - low) / open ceiling (0.003 = 0.3%)
    pub max_amplitude: f64,
    /// %B above this is an upper-band touch
    pub upper_touch: f64,
    /// %B below this is a lower-band touch
    pub lower_touch: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            min_candles: 15,
            consolidation_candles: 3,
            max_amplitude: 0.003,
            upper_touch: 0.95,
            lower_touch: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ConfirmConfig {
    /// Volume strength at or above this is HIGH confidence
    pub high_confidence_volume: f64,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            high_confidence_volume: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DedupConfig {
    /// Keys older than this many calendar days are purged
    pub retention_days: i64,
    /// Operator calendar offset from UTC in minutes (-180 = BRT)
    pub utc_offset_minutes: i32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            retention_days: 2,
            utc_offset_minutes: -180,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    /// REST base URL
    pub rest_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Send alerts to Telegram (false = log only)
    pub enabled: bool,
    /// Bot API base URL
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
    /// Append notified signals to the audit CSV
    pub audit_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    pub level: String,
    /// JSON log lines instead of human-readable ones
    pub json: bool,
}

/// Telegram credentials, read from the environment only
#[derive(Clone)]
pub struct TelegramSecrets {
    pub token: String,
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSecrets")
            .field("token", &mask_secret(&self.token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// "********abcd" - only the last four characters survive
pub fn mask_secret(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}{}", "*".repeat(8), tail)
}
