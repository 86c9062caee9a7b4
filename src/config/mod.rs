//! Configuration management for ReversalBot
//!
//! Loads from config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::BotError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub bands: BandsConfig,
    pub context: ContextConfig,
    pub entry: EntryConfig,
    pub confirm: ConfirmConfig,
    pub dedup: DedupConfig,
    pub binance: BinanceConfig,
    pub telegram: TelegramConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Bot defaults
            .set_default("bot.instruments", vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"])?
            .set_default("bot.poll_interval_secs", 300)?
            .set_default("bot.context_timeframe", "1h")?
            .set_default("bot.entry_timeframe", "5m")?
            .set_default("bot.candle_limit", 50)?
            // Band defaults
            .set_default("bands.period", 20)?
            .set_default("bands.multiplier", 2.0)?
            // Context defaults
            .set_default("context.min_candles", 25)?
            .set_default("context.volume_lookback", 20)?
            .set_default("context.extremum_break_pct", 0.005)?
            .set_default("context.volume_surge", 1.2)?
            // Entry defaults
            .set_default("entry.min_candles", 15)?
            .set_default("entry.consolidation_candles", 3)?
            .set_default("entry.max_amplitude", 0.003)?
            .set_default("entry.upper_touch", 0.95)?
            .set_default("entry.lower_touch", 0.05)?
            // Confirmation defaults
            .set_default("confirm.high_confidence_volume", 1.5)?
            // Dedup defaults
            .set_default("dedup.retention_days", 2)?
            .set_default("dedup.utc_offset_minutes", -180)?
            // Binance defaults
            .set_default("binance.rest_url", "https://api.binance.com")?
            .set_default("binance.timeout_secs", 10)?
            // Telegram defaults
            .set_default("telegram.enabled", true)?
            .set_default("telegram.api_url", "https://api.telegram.org")?
            .set_default("telegram.timeout_secs", 10)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            .set_default("persistence.audit_enabled", true)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (REVERSAL__*)
            .add_source(
                Environment::with_prefix("REVERSAL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.instruments")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Reject thresholds that would make detection meaningless
    pub fn validate(&self) -> Result<(), BotError> {
        let invalid = |msg: &str| Err(BotError::InvalidConfig(msg.to_string()));

        if self.bot.instruments.is_empty() {
            return invalid("bot.instruments must not be empty");
        }
        if self.bot.poll_interval_secs == 0 {
            return invalid("bot.poll_interval_secs must be positive");
        }
        self.bot.context_timeframe()?;
        self.bot.entry_timeframe()?;

        if self.bands.period < 2 {
            return invalid("bands.period must be at least 2");
        }
        if !(self.bands.multiplier.is_finite() && self.bands.multiplier > 0.0) {
            return invalid("bands.multiplier must be positive");
        }
        // The latest closed entry candle needs a band value
        if self.bot.candle_limit < self.bands.period + 1 {
            return invalid("bot.candle_limit must exceed bands.period");
        }

        let ctx = &self.context;
        if ctx.volume_lookback == 0 || ctx.min_candles <= ctx.volume_lookback {
            return invalid("context.min_candles must exceed context.volume_lookback");
        }
        if !(ctx.extremum_break_pct > 0.0 && ctx.extremum_break_pct < 1.0) {
            return invalid("context.extremum_break_pct must be in (0, 1)");
        }
        if !(ctx.volume_surge.is_finite() && ctx.volume_surge > 0.0) {
            return invalid("context.volume_surge must be positive");
        }

        let entry = &self.entry;
        if entry.consolidation_candles == 0 || entry.min_candles < entry.consolidation_candles + 1 {
            return invalid("entry.min_candles must exceed entry.consolidation_candles");
        }
        if !(entry.max_amplitude.is_finite() && entry.max_amplitude > 0.0) {
            return invalid("entry.max_amplitude must be positive");
        }
        if !(0.0 < entry.lower_touch
            && entry.lower_touch < entry.upper_touch
            && entry.upper_touch < 1.0)
        {
            return invalid("entry touch thresholds must satisfy 0 < lower < upper < 1");
        }

        if !(self.confirm.high_confidence_volume.is_finite()
            && self.confirm.high_confidence_volume > 0.0)
        {
            return invalid("confirm.high_confidence_volume must be positive");
        }
        if self.dedup.retention_days < 1 {
            return invalid("dedup.retention_days must be at least 1");
        }
        if self.dedup.utc_offset_minutes.abs() >= 24 * 60 {
            return invalid("dedup.utc_offset_minutes must be within ±24h");
        }

        Ok(())
    }

    /// Validate required environment variables
    pub fn validate_env(&self) -> Result<()> {
        if !self.telegram.enabled {
            return Ok(());
        }
        self.telegram_secrets()?;
        Ok(())
    }

    /// Read TELEGRAM_TOKEN and CHAT_ID from the environment
    pub fn telegram_secrets(&self) -> Result<TelegramSecrets> {
        let token = match std::env::var("TELEGRAM_TOKEN") {
            Ok(t) if !t.trim().is_empty() => t,
            _ => bail!("Required environment variable TELEGRAM_TOKEN is not set"),
        };
        let chat_id = std::env::var("CHAT_ID")
            .context("Required environment variable CHAT_ID is not set")?;
        let chat_id: i64 = chat_id
            .trim()
            .parse()
            .with_context(|| format!("CHAT_ID must be an integer, got {chat_id:?}"))?;

        Ok(TelegramSecrets { token, chat_id })
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        let token = std::env::var("TELEGRAM_TOKEN")
            .map(|t| mask_secret(&t))
            .unwrap_or_else(|_| "unset".to_string());
        format!(
            "instruments={:?} interval={}s context={} entry={} bb={}x{:.1} surge={:.2} telegram={} token={}",
            self.bot.instruments,
            self.bot.poll_interval_secs,
            self.bot.context_timeframe,
            self.bot.entry_timeframe,
            self.bands.period,
            self.bands.multiplier,
            self.context.volume_surge,
            self.telegram.enabled,
            token
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                instruments: vec!["BTCUSDT".into(), "ETHUSDT".into(), "SOLUSDT".into()],
                poll_interval_secs: 300,
                context_timeframe: "1h".into(),
                entry_timeframe: "5m".into(),
                candle_limit: 50,
            },
            bands: BandsConfig::default(),
            context: ContextConfig::default(),
            entry: EntryConfig::default(),
            confirm: ConfirmConfig::default(),
            dedup: DedupConfig::default(),
            binance: BinanceConfig {
                rest_url: "https://api.binance.com".into(),
                timeout_secs: 10,
            },
            telegram: TelegramConfig {
                enabled: true,
                api_url: "https://api.telegram.org".into(),
                timeout_secs: 10,
            },
            persistence: PersistenceConfig {
                data_dir: "./data".into(),
                audit_enabled: true,
            },
            logging: LoggingConfig {
                level: "info".into(),
                json: false,
            },
        }
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
