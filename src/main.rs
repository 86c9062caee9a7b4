//! ReversalBot - multi-timeframe reversal alerts

use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use reversal_bot::alerts::{LogNotifier, Notifier, TelegramNotifier};
use reversal_bot::config::AppConfig;
use reversal_bot::logging::init_logging;
use reversal_bot::oracle::BinanceKlines;
use reversal_bot::persistence::AuditLog;
use reversal_bot::strategy::ReversalStrategy;
use reversal_bot::ReversalBot;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    if let Err(e) = config.validate() {
        error!(error = %e, "❌ Invalid configuration");
        return Err(e.into());
    }
    if let Err(e) = config.validate_env() {
        error!(error = %e, "❌ Missing environment");
        return Err(e);
    }
    info!(config = %config.digest(), "⚙️ Configuration loaded");

    let offset = FixedOffset::east_opt(config.dedup.utc_offset_minutes * 60)
        .unwrap_or_else(|| Utc.fix());

    let strategy = ReversalStrategy::from_config(&config)?;
    let source = BinanceKlines::new(&config.binance.rest_url, config.binance.timeout_secs)?;

    let notifier: Arc<dyn Notifier> = if config.telegram.enabled {
        let secrets = config.telegram_secrets()?;
        Arc::new(TelegramNotifier::new(
            &config.telegram.api_url,
            secrets,
            offset,
            config.telegram.timeout_secs,
        )?)
    } else {
        warn!("⚠️ Telegram disabled, alerts go to the log only");
        Arc::new(LogNotifier::new(offset))
    };

    let audit = if config.persistence.audit_enabled {
        let audit = AuditLog::new(&config.persistence.data_dir)
            .context("Failed to open signal audit log")?;
        info!(path = %audit.path().display(), "📝 Audit log ready");
        Some(audit)
    } else {
        None
    };

    let mut bot = ReversalBot::new(config, strategy, Arc::new(source), notifier, audit);
    bot.run().await?;

    info!("👋 Reversal bot stopped");
    Ok(())
}
