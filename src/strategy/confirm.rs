//! Signal confirmation - both timeframes must agree on direction
//!
//! resistance + upper touch -> SELL, support + lower touch -> BUY.
//! Every other pairing is a timeframe misalignment and yields nothing.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ConfirmConfig;
use crate::types::{
    Action, Confidence, ContextZone, EntryEvent, EntryKind, Signal, Timeframe, ZoneKind,
};

#[derive(Debug, Clone)]
pub struct SignalConfirmer {
    config: ConfirmConfig,
    context_timeframe: Timeframe,
    entry_timeframe: Timeframe,
}

impl SignalConfirmer {
    pub fn new(
        config: ConfirmConfig,
        context_timeframe: Timeframe,
        entry_timeframe: Timeframe,
    ) -> Self {
        Self {
            config,
            context_timeframe,
            entry_timeframe,
        }
    }

    /// Combine one context zone and one entry event from the same poll
    /// cycle into a signal stamped `emitted_at`.
    pub fn confirm(
        &self,
        instrument: &str,
        context: Option<&ContextZone>,
        entry: Option<&EntryEvent>,
        emitted_at: DateTime<Utc>,
    ) -> Option<Signal> {
        let (context, entry) = match (context, entry) {
            (Some(c), Some(e)) => (c, e),
            _ => return None,
        };

        let action = match (context.kind, entry.kind) {
            (ZoneKind::Resistance, EntryKind::TouchUpper) => Action::Sell,
            (ZoneKind::Support, EntryKind::TouchLower) => Action::Buy,
            (ZoneKind::Resistance, EntryKind::TouchLower)
            | (ZoneKind::Support, EntryKind::TouchUpper) => {
                info!(
                    instrument,
                    context = %context.kind,
                    entry = %entry.kind,
                    "ℹ️ Timeframes not aligned"
                );
                return None;
            }
        };

        let risk_percent = risk_percent(context.zone_price, entry.current_close)?;
        let confidence = if context.volume_strength >= self.config.high_confidence_volume {
            Confidence::High
        } else {
            Confidence::Medium
        };

        let signal = Signal {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            instrument: instrument.to_string(),
            entry_price: entry.current_close,
            zone_price: context.zone_price,
            risk_percent,
            volume_strength: context.volume_strength,
            confidence,
            emitted_at,
            context_timeframe: self.context_timeframe,
            entry_timeframe: self.entry_timeframe,
        };

        info!(
            instrument,
            action = %signal.action,
            entry = signal.entry_price,
            zone = signal.zone_price,
            risk_pct = signal.risk_percent,
            confidence = %signal.confidence,
            "✅ Signal confirmed"
        );

        Some(signal)
    }
}

impl Default for SignalConfirmer {
    fn default() -> Self {
        Self::new(ConfirmConfig::default(), Timeframe::Hour1, Timeframe::Min5)
    }
}

/// Distance from the zone as a percentage of the zone price
pub fn risk_percent(zone_price: f64, entry_price: f64) -> Option<f64> {
    if zone_price > 0.0 && entry_price.is_finite() {
        Some((zone_price - entry_price).abs() / zone_price * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(kind: ZoneKind, zone_price: f64, volume_strength: f64) -> ContextZone {
        ContextZone {
            kind,
            zone_price,
            current_close: zone_price,
            volume_strength,
            timestamp: 1_700_000_000_000,
        }
    }

    fn entry(kind: EntryKind, close: f64) -> EntryEvent {
        EntryEvent {
            kind,
            percent_b: if kind == EntryKind::TouchUpper { 0.97 } else { 0.03 },
            mean_amplitude: 0.002,
            current_close: close,
            timestamp: 1_700_000_300_000,
        }
    }

    #[test]
    fn test_sell_on_resistance_and_upper_touch() {
        let confirmer = SignalConfirmer::default();
        let now = Utc::now();
        let signal = confirmer
            .confirm(
                "BTCUSDT",
                Some(&zone(ZoneKind::Resistance, 100.0, 1.5)),
                Some(&entry(EntryKind::TouchUpper, 98.0)),
                now,
            )
            .unwrap();

        assert_eq!(signal.action, Action::Sell);
        assert_eq!(signal.instrument, "BTCUSDT");
        assert_eq!(signal.entry_price, 98.0);
        assert_eq!(signal.zone_price, 100.0);
        assert!((signal.risk_percent - 2.0).abs() < 1e-9);
        // 1.5 sits exactly on the threshold and counts as HIGH
        assert_eq!(signal.confidence, Confidence::High);
        assert_eq!(signal.emitted_at, now);
        assert_eq!(signal.context_timeframe, Timeframe::Hour1);
        assert_eq!(signal.entry_timeframe, Timeframe::Min5);
    }

    #[test]
    fn test_buy_on_support_and_lower_touch() {
        let signal = SignalConfirmer::default()
            .confirm(
                "ETHUSDT",
                Some(&zone(ZoneKind::Support, 2000.0, 1.3)),
                Some(&entry(EntryKind::TouchLower, 2030.0)),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(signal.action, Action::Buy);
        assert!((signal.risk_percent - 1.5).abs() < 1e-9);
        assert_eq!(signal.confidence, Confidence::Medium);
    }

    #[test]
    fn test_confidence_boundary() {
        let confirmer = SignalConfirmer::default();
        let just_below = confirmer
            .confirm(
                "BTCUSDT",
                Some(&zone(ZoneKind::Resistance, 100.0, 1.4999)),
                Some(&entry(EntryKind::TouchUpper, 99.0)),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(just_below.confidence, Confidence::Medium);

        let above = confirmer
            .confirm(
                "BTCUSDT",
                Some(&zone(ZoneKind::Resistance, 100.0, 2.0)),
                Some(&entry(EntryKind::TouchUpper, 99.0)),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(above.confidence, Confidence::High);
    }

    #[test]
    fn test_misaligned_pairings_yield_nothing() {
        let confirmer = SignalConfirmer::default();
        for strength in [1.21, 1.5, 3.0] {
            for (zone_price, close) in [(100.0, 98.0), (100.0, 100.0), (50.0, 75.0)] {
                assert!(confirmer
                    .confirm(
                        "BTCUSDT",
                        Some(&zone(ZoneKind::Resistance, zone_price, strength)),
                        Some(&entry(EntryKind::TouchLower, close)),
                        Utc::now(),
                    )
                    .is_none());
                assert!(confirmer
                    .confirm(
                        "BTCUSDT",
                        Some(&zone(ZoneKind::Support, zone_price, strength)),
                        Some(&entry(EntryKind::TouchUpper, close)),
                        Utc::now(),
                    )
                    .is_none());
            }
        }
    }

    #[test]
    fn test_missing_input_yields_nothing() {
        let confirmer = SignalConfirmer::default();
        let z = zone(ZoneKind::Resistance, 100.0, 1.5);
        let e = entry(EntryKind::TouchUpper, 98.0);
        assert!(confirmer.confirm("BTCUSDT", None, Some(&e), Utc::now()).is_none());
        assert!(confirmer.confirm("BTCUSDT", Some(&z), None, Utc::now()).is_none());
        assert!(confirmer.confirm("BTCUSDT", None, None, Utc::now()).is_none());
    }

    #[test]
    fn test_risk_percent_guards_zero_zone() {
        assert!(risk_percent(0.0, 1.0).is_none());
        assert!((risk_percent(200.0, 202.0).unwrap() - 1.0).abs() < 1e-9);
    }
}
