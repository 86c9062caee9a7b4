//! Oracle module - market data collaborators
//!
//! Pulls ordered OHLCV candles for an instrument/timeframe. A failure or an
//! empty result only skips the current cycle for that instrument.

mod binance;

pub use binance::{parse_klines, BinanceKlines};

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Candle, Timeframe};

/// Trait for candle data providers
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch the latest `limit` candles, oldest first. The newest candle
    /// may still be in progress.
    async fn fetch_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}
