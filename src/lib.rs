//! ReversalBot Library
//!
//! Multi-timeframe reversal signals: 1h reversal zones confirmed by a
//! 5m Bollinger Band touch with consolidation, delivered as Telegram alerts

pub mod alerts;
pub mod bot;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod oracle;
pub mod persistence;
pub mod strategy;
pub mod types;

pub use bot::{CycleReport, ReversalBot};
pub use error::BotError;
