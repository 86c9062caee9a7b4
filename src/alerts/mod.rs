//! Alerts - delivery of confirmed signals
//!
//! - Markdown alert formatting
//! - Telegram Bot API delivery
//! - Log-only delivery for dry runs
//! - Per-day deduplication gate

pub mod dedup;
pub use dedup::{DedupKey, DeduplicationGate};

use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::config::TelegramSecrets;
use crate::error::BotError;
use crate::types::{display_pair, Action, Signal};

/// Trait for alert channels
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Deliver one signal
    async fn notify(&self, signal: &Signal) -> Result<(), BotError>;
}

/// Brazilian currency format, e.g. `R$ 1.234,56`
pub fn format_brl(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("R$ {}{},{}", sign, grouped, frac_part)
}

/// Markdown alert text, times shown in `offset`
pub fn format_alert(signal: &Signal, offset: FixedOffset) -> String {
    let (emoji, action_fmt, zone_name, stop_side) = match signal.action {
        Action::Sell => ("🔻", "SELL 📉", "resistance", "above"),
        Action::Buy => ("🟢", "BUY 📈", "support", "below"),
    };
    let rule = "═".repeat(35);
    let local_time = signal.emitted_at.with_timezone(&offset);

    format!(
        "{emoji} *REVERSAL SIGNAL CONFIRMED* {emoji}\n\n\
         {rule}\n\
         🪙 *{pair}*\n\
         📊 *ACTION:* {action_fmt}\n\
         💰 *Entry:* {entry}\n\
         🎯 *Zone:* {zone}\n\
         {rule}\n\n\
         🔍 *MULTI-TIMEFRAME CONFIRMATION*\n   \
         • Context (`{ctx_tf}`): {zone_name} zone identified\n   \
         • Entry (`{entry_tf}`): Bollinger Bands + consolidation\n   \
         • Volume: `{volume:.2}x` average ({confidence} confidence)\n   \
         • Estimated risk: `{risk:.2}%`\n\n\
         ⚠️ *RISK MANAGEMENT*\n   \
         • Stop Loss: 2% {stop_side} entry\n   \
         • Take Profit: 1:2 risk/reward\n   \
         • Max leverage: 3x\n   \
         • Risk per trade: ≤ 2% of capital\n\n\
         ⏰ *Signal time:* {time} (UTC{offset})",
        pair = display_pair(&signal.instrument),
        entry = format_brl(signal.entry_price),
        zone = format_brl(signal.zone_price),
        ctx_tf = signal.context_timeframe,
        entry_tf = signal.entry_timeframe,
        volume = signal.volume_strength,
        confidence = signal.confidence,
        risk = signal.risk_percent,
        time = local_time.format("%d/%m %H:%M:%S"),
        offset = offset,
    )
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage` delivery
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    secrets: TelegramSecrets,
    offset: FixedOffset,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        secrets: TelegramSecrets,
        offset: FixedOffset,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            secrets,
            offset,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), BotError> {
        let text = format_alert(signal, self.offset);
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.secrets.token);
        let body = SendMessage {
            chat_id: self.secrets.chat_id,
            text: &text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        // without_url() keeps the bot token out of error messages
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Notification(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Notification(format!(
                "Telegram API returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        info!(
            action = %signal.action,
            instrument = %signal.instrument,
            "✅ Alert sent to Telegram"
        );
        Ok(())
    }
}

/// Dry-run channel: the alert goes to the log only
pub struct LogNotifier {
    offset: FixedOffset,
}

impl LogNotifier {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "Log"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), BotError> {
        info!(
            action = %signal.action,
            instrument = %signal.instrument,
            "📣 Alert (dry run)\n{}",
            format_alert(signal, self.offset)
        );
        Ok(())
    }
}
