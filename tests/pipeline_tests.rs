//! End-to-end tests of the reversal pipeline on synthetic series

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    use reversal_bot::alerts::{format_alert, Notifier};
    use reversal_bot::config::AppConfig;
    use reversal_bot::features::compute_bands;
    use reversal_bot::oracle::CandleSource;
    use reversal_bot::persistence::AuditLog;
    use reversal_bot::strategy::{ContextDetector, EntryDetector, ReversalStrategy};
    use reversal_bot::types::{Action, Candle, Confidence, Timeframe};
    use reversal_bot::{BotError, CycleReport, ReversalBot};

    const HOUR: i64 = 3_600_000;
    const FIVE_MIN: i64 = 300_000;
    const BASE: i64 = 1_700_000_000_000;

    // ============================================================================
    // Synthetic market
    // ============================================================================

    fn hour_candle(i: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: BASE + i * HOUR,
            open,
            high,
            low,
            close,
            volume,
            close_time: BASE + (i + 1) * HOUR - 1,
        }
    }

    fn five_min_candle(start: i64, i: i64, price: f64, half_range: f64) -> Candle {
        Candle {
            open_time: start + i * FIVE_MIN,
            open: price,
            high: price + half_range,
            low: price - half_range,
            close: price,
            volume: 10.0,
            close_time: start + (i + 1) * FIVE_MIN - 1,
        }
    }

    /// 30 closed hours ending in a rejection at 100 on 1.55x volume, plus
    /// one hour still in progress
    fn resistance_hours() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..29)
            .map(|i| hour_candle(i, 98.5, 99.0, 98.0, 98.5, 100.0))
            .collect();
        candles.push(hour_candle(29, 98.6, 100.0, 98.5, 99.4, 160.0));
        candles.push(hour_candle(30, 99.4, 99.5, 99.3, 99.4, 5.0));
        candles
    }

    /// 50 tight five-minute candles; the last closed one jumps `jump`
    fn entry_minutes(jump: f64) -> Vec<Candle> {
        let start = BASE + 24 * HOUR;
        let mut candles: Vec<Candle> = (0..48)
            .map(|i| five_min_candle(start, i, 98.0 + i as f64 * 0.001, 0.05))
            .collect();
        let top = 98.047 + jump;
        candles.push(five_min_candle(start, 48, top, 0.05));
        candles.push(five_min_candle(start, 49, top, 0.02));
        candles
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(BASE + 30 * HOUR + 60_000).unwrap()
    }

    struct SyntheticMarket {
        hours: Vec<Candle>,
        minutes: Vec<Candle>,
    }

    #[async_trait]
    impl CandleSource for SyntheticMarket {
        fn name(&self) -> &'static str {
            "synthetic"
        }

        async fn fetch_candles(
            &self,
            _instrument: &str,
            timeframe: Timeframe,
            limit: usize,
        ) -> anyhow::Result<Vec<Candle>> {
            let series = match timeframe {
                Timeframe::Hour1 => &self.hours,
                Timeframe::Min5 => &self.minutes,
                other => anyhow::bail!("unexpected timeframe {other}"),
            };
            let skip = series.len().saturating_sub(limit);
            Ok(series[skip..].to_vec())
        }
    }

    #[derive(Default)]
    struct Inbox {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Inbox {
        fn name(&self) -> &'static str {
            "inbox"
        }

        async fn notify(&self, signal: &reversal_bot::types::Signal) -> Result<(), BotError> {
            let text = format_alert(signal, FixedOffset::west_opt(3 * 3600).unwrap());
            self.messages.lock().unwrap().push(text);
            Ok(())
        }
    }

    // ============================================================================
    // Detection
    // ============================================================================

    #[test]
    fn test_detectors_agree_on_sell_setup() {
        let hours = resistance_hours();
        let minutes = entry_minutes(0.3);

        let zone = ContextDetector::default()
            .detect(&hours[..hours.len() - 1])
            .unwrap();
        assert_eq!(zone.zone_price, 100.0);
        assert!((zone.volume_strength - 160.0 / 103.0).abs() < 1e-9);

        let bands = compute_bands(&minutes, 20, 2.0).unwrap();
        let event = EntryDetector::default().detect(&minutes, &bands).unwrap();
        assert!(event.percent_b > 0.95);
        assert!(event.mean_amplitude < 0.003);
    }

    #[tokio::test]
    async fn test_strategy_emits_sell_signal() {
        let market = SyntheticMarket {
            hours: resistance_hours(),
            minutes: entry_minutes(0.3),
        };
        let strategy = ReversalStrategy::from_config(&AppConfig::default()).unwrap();

        let signal = strategy
            .evaluate(&market, "BTCUSDT", now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(signal.action, Action::Sell);
        assert_eq!(signal.instrument, "BTCUSDT");
        assert_eq!(signal.zone_price, 100.0);
        assert!((signal.entry_price - 98.347).abs() < 1e-9);
        let expected_risk = (100.0 - 98.347) / 100.0 * 100.0;
        assert!((signal.risk_percent - expected_risk).abs() < 1e-9);
        assert_eq!(signal.confidence, Confidence::High);
        assert_eq!(signal.context_timeframe, Timeframe::Hour1);
        assert_eq!(signal.entry_timeframe, Timeframe::Min5);
    }

    #[tokio::test]
    async fn test_opposite_entry_touch_is_not_a_signal() {
        let market = SyntheticMarket {
            hours: resistance_hours(),
            minutes: entry_minutes(-0.3),
        };
        let signal = ReversalStrategy::default()
            .evaluate(&market, "BTCUSDT", now())
            .await
            .unwrap();
        assert!(signal.is_none());
    }

    // ============================================================================
    // Poller
    // ============================================================================

    #[tokio::test]
    async fn test_bot_alerts_once_and_records_audit_row() {
        let data_dir = std::env::temp_dir().join(format!(
            "reversal_pipeline_{}",
            uuid::Uuid::new_v4()
        ));
        let audit = AuditLog::new(data_dir.to_str().unwrap()).unwrap();
        let audit_path = audit.path().to_path_buf();

        let mut config = AppConfig::default();
        config.bot.instruments = vec!["BTCUSDT".into()];
        let strategy = ReversalStrategy::from_config(&config).unwrap();
        let inbox = Arc::new(Inbox::default());
        let market = SyntheticMarket {
            hours: resistance_hours(),
            minutes: entry_minutes(0.3),
        };

        let mut bot = ReversalBot::new(
            config,
            strategy,
            Arc::new(market),
            inbox.clone(),
            Some(audit),
        );

        let first = bot.run_cycle(now()).await;
        assert_eq!(
            first,
            CycleReport {
                evaluated: 1,
                signals: 1,
                notified: 1,
                suppressed: 0,
                failures: 0
            }
        );

        let second = bot.run_cycle(now() + Duration::minutes(5)).await;
        assert_eq!(second.suppressed, 1);
        assert_eq!(second.notified, 0);

        let messages = inbox.messages.lock().unwrap().clone();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("*BTC/USDT*"));
        assert!(messages[0].contains("SELL"));
        assert!(messages[0].contains("R$ 100,00"));

        let content = std::fs::read_to_string(&audit_path).unwrap();
        assert_eq!(content.lines().count(), 2, "header plus one row");
        assert!(content.contains("BTCUSDT"));

        let _ = std::fs::remove_dir_all(&data_dir);
    }
}
