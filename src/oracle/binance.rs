//! Binance REST client for historical klines
//!
//! Public endpoint, no authentication.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::error::BotError;
use crate::oracle::CandleSource;
use crate::types::{Candle, Timeframe};

const KLINES_PATH: &str = "/api/v3/klines";

#[derive(Debug, Clone)]
pub struct BinanceKlines {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceKlines {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn klines_url(&self) -> String {
        format!("{}{}", self.base_url, KLINES_PATH)
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    fn name(&self) -> &'static str {
        "Binance"
    }

    async fn fetch_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        tracing::debug!(
            instrument,
            timeframe = %timeframe,
            limit,
            "📥 Fetching klines from Binance"
        );

        let response = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", instrument.to_string()),
                ("interval", timeframe.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))
            .with_context(|| format!("Failed to fetch {} {} klines", instrument, timeframe))?;

        if !response.status().is_success() {
            bail!(BotError::Network(format!(
                "Binance API returned error: {}",
                response.status()
            )));
        }

        // [[open_time, open, high, low, close, volume, close_time, ...], ...]
        let klines: Vec<Vec<serde_json::Value>> = response
            .json()
            .await
            .map_err(|e| BotError::Network(e.to_string()))
            .context("Failed to parse Binance klines response")?;

        let candles = parse_klines(klines);

        tracing::debug!(
            instrument,
            timeframe = %timeframe,
            count = candles.len(),
            "✅ Klines fetched"
        );

        Ok(candles)
    }
}

/// Convert the raw kline arrays, dropping malformed rows
pub fn parse_klines(klines: Vec<Vec<serde_json::Value>>) -> Vec<Candle> {
    klines
        .into_iter()
        .filter_map(|kline| {
            if kline.len() < 7 {
                return None;
            }

            Some(Candle {
                open_time: kline[0].as_i64()?,
                open: parse_number(&kline[1])?,
                high: parse_number(&kline[2])?,
                low: parse_number(&kline[3])?,
                close: parse_number(&kline[4])?,
                volume: parse_number(&kline[5])?,
                close_time: kline[6].as_i64()?,
            })
        })
        .collect()
}

/// Binance sends prices as strings; accept plain numbers too
fn parse_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}
