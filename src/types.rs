//! Core types used throughout ReversalBot
//!
//! Defines candles, timeframes, the transient detector classifications and
//! the confirmed signal that leaves the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported kline intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Day1,
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Min5
    }
}

impl Timeframe {
    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            Timeframe::Min1 => MINUTE,
            Timeframe::Min5 => 5 * MINUTE,
            Timeframe::Min15 => 15 * MINUTE,
            Timeframe::Min30 => 30 * MINUTE,
            Timeframe::Hour1 => 60 * MINUTE,
            Timeframe::Hour4 => 4 * 60 * MINUTE,
            Timeframe::Day1 => 24 * 60 * MINUTE,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" => Some(Timeframe::Min1),
            "5m" | "5min" => Some(Timeframe::Min5),
            "15m" | "15min" => Some(Timeframe::Min15),
            "30m" | "30min" => Some(Timeframe::Min30),
            "1h" | "1hour" => Some(Timeframe::Hour1),
            "4h" | "4hour" => Some(Timeframe::Hour4),
            "1d" | "1day" => Some(Timeframe::Day1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Min1 => write!(f, "1m"),
            Timeframe::Min5 => write!(f, "5m"),
            Timeframe::Min15 => write!(f, "15m"),
            Timeframe::Min30 => write!(f, "30m"),
            Timeframe::Hour1 => write!(f, "1h"),
            Timeframe::Hour4 => write!(f, "4h"),
            Timeframe::Day1 => write!(f, "1d"),
        }
    }
}

/// Candlestick data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time (start of period, ms since epoch)
    pub open_time: i64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume in base currency
    pub volume: f64,
    /// Close time (end of period, ms since epoch)
    pub close_time: i64,
}

impl Candle {
    /// A candle is closed once its close time has elapsed
    pub fn is_closed(&self, now_ms: i64) -> bool {
        self.close_time < now_ms
    }

    /// Relative range (high - low) / open, `None` for a non-positive open
    pub fn amplitude(&self) -> Option<f64> {
        if self.open > 0.0 {
            Some((self.high - self.low) / self.open)
        } else {
            None
        }
    }
}

/// Ordered candles, strictly increasing by open_time
pub type CandleSeries = Vec<Candle>;

/// Helpers over a chronological candle slice
pub trait CandleSeriesExt {
    /// Prefix of candles that have closed at `now_ms`
    fn closed(&self, now_ms: i64) -> &[Candle];
    fn closes(&self) -> Vec<f64>;
    fn volumes(&self) -> Vec<f64>;
}

impl CandleSeriesExt for [Candle] {
    fn closed(&self, now_ms: i64) -> &[Candle] {
        let open_tail = self
            .iter()
            .rev()
            .take_while(|c| !c.is_closed(now_ms))
            .count();
        &self[..self.len() - open_tail]
    }

    fn closes(&self) -> Vec<f64> {
        self.iter().map(|c| c.close).collect()
    }

    fn volumes(&self) -> Vec<f64> {
        self.iter().map(|c| c.volume).collect()
    }
}

/// Higher-timeframe reversal zone kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Resistance,
    Support,
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneKind::Resistance => write!(f, "resistance"),
            ZoneKind::Support => write!(f, "support"),
        }
    }
}

/// Reversal zone found on the last closed higher-timeframe candle.
/// Valid only for the candle that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextZone {
    pub kind: ZoneKind,
    /// The broken extremum (high for resistance, low for support)
    pub zone_price: f64,
    pub current_close: f64,
    /// Candle volume / mean volume over the lookback
    pub volume_strength: f64,
    /// Open time of the candle that produced the zone
    pub timestamp: i64,
}

/// Lower-timeframe band touch kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    TouchUpper,
    TouchLower,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::TouchUpper => write!(f, "touch_upper"),
            EntryKind::TouchLower => write!(f, "touch_lower"),
        }
    }
}

/// Touch-then-consolidate event on the latest closed lower-timeframe candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryEvent {
    pub kind: EntryKind,
    pub percent_b: f64,
    pub mean_amplitude: f64,
    pub current_close: f64,
    pub timestamp: i64,
}

/// Trading action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// Signal confidence label. There is no low tier: without a volume surge
/// no zone is detected in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
        }
    }
}

/// Confirmed trading signal, the only durable output of the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal ID
    pub id: String,
    pub action: Action,
    /// Exchange symbol, e.g. "BTCUSDT"
    pub instrument: String,
    /// Close of the latest closed entry-timeframe candle
    pub entry_price: f64,
    pub zone_price: f64,
    /// |zone - entry| / zone * 100
    pub risk_percent: f64,
    pub volume_strength: f64,
    pub confidence: Confidence,
    pub emitted_at: DateTime<Utc>,
    pub context_timeframe: Timeframe,
    pub entry_timeframe: Timeframe,
}

/// Human-readable pair, "BTCUSDT" -> "BTC/USDT"
pub fn display_pair(instrument: &str) -> String {
    for quote in ["USDT", "USDC", "BUSD", "BTC", "ETH"] {
        if let Some(base) = instrument.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{}/{}", base, quote);
            }
        }
    }
    instrument.to_string()
}
