//! Poller - periodic evaluation of every configured instrument
//!
//! Each cycle evaluates the instruments that are due, concurrently. Signals
//! go through the deduplication gate, then the notifier, then the audit log.
//! One instrument failing never aborts the cycle or the loop.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::alerts::{DeduplicationGate, Notifier};
use crate::config::AppConfig;
use crate::oracle::CandleSource;
use crate::persistence::AuditLog;
use crate::strategy::ReversalStrategy;
use crate::types::Signal;

/// Outcome counters of one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub evaluated: usize,
    pub signals: usize,
    pub notified: usize,
    pub suppressed: usize,
    pub failures: usize,
}

pub struct ReversalBot {
    config: AppConfig,
    strategy: ReversalStrategy,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    audit: Option<AuditLog>,
    dedup: Arc<Mutex<DeduplicationGate>>,
    last_checked: HashMap<String, DateTime<Utc>>,
}

impl ReversalBot {
    pub fn new(
        config: AppConfig,
        strategy: ReversalStrategy,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        audit: Option<AuditLog>,
    ) -> Self {
        let dedup = DeduplicationGate::from_config(&config.dedup);
        Self {
            config,
            strategy,
            source,
            notifier,
            audit,
            dedup: Arc::new(Mutex::new(dedup)),
            last_checked: HashMap::new(),
        }
    }

    pub fn dedup(&self) -> Arc<Mutex<DeduplicationGate>> {
        Arc::clone(&self.dedup)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.bot.poll_interval_secs)
    }

    fn is_due(&self, instrument: &str, now: DateTime<Utc>) -> bool {
        let interval = ChronoDuration::seconds(self.config.bot.poll_interval_secs as i64);
        match self.last_checked.get(instrument) {
            Some(last) => now - *last >= interval,
            None => true,
        }
    }

    /// Evaluate every due instrument once
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let due: Vec<String> = self
            .config
            .bot
            .instruments
            .iter()
            .filter(|i| self.is_due(i, now))
            .cloned()
            .collect();

        let mut report = CycleReport {
            evaluated: due.len(),
            ..CycleReport::default()
        };
        if due.is_empty() {
            return report;
        }

        let source = self.source.as_ref();
        let strategy = &self.strategy;
        let results = join_all(
            due.iter()
                .map(|instrument| strategy.evaluate(source, instrument, now)),
        )
        .await;

        for (instrument, result) in due.iter().zip(results) {
            match result {
                Ok(Some(signal)) => {
                    report.signals += 1;
                    self.dispatch(&signal, &mut report).await;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failures += 1;
                    warn!(instrument = %instrument, error = %e, "⚠️ Evaluation failed, skipping this cycle");
                }
            }
            self.last_checked.insert(instrument.clone(), now);
        }

        report
    }

    async fn dispatch(&self, signal: &Signal, report: &mut CycleReport) {
        if !self.dedup.lock().await.should_emit(signal) {
            report.suppressed += 1;
            info!(
                instrument = %signal.instrument,
                action = %signal.action,
                "ℹ️ Alert already sent today, suppressed"
            );
            return;
        }

        match self.notifier.notify(signal).await {
            Ok(()) => {
                report.notified += 1;
                info!(
                    instrument = %signal.instrument,
                    action = %signal.action,
                    entry = signal.entry_price,
                    zone = signal.zone_price,
                    confidence = %signal.confidence,
                    channel = self.notifier.name(),
                    "🚨 Signal notified"
                );
                if let Some(audit) = &self.audit {
                    if let Err(e) = audit.record(signal).await {
                        warn!(error = %e, "⚠️ Failed to record signal");
                    }
                }
            }
            Err(e) => {
                report.failures += 1;
                self.dedup.lock().await.release(signal);
                error!(
                    instrument = %signal.instrument,
                    action = %signal.action,
                    error = %e,
                    channel = self.notifier.name(),
                    "❌ Notification failed, will retry next cycle"
                );
            }
        }
    }

    /// Poll until Ctrl-C
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            instruments = ?self.config.bot.instruments,
            interval_secs = self.config.bot.poll_interval_secs,
            source = self.source.name(),
            channel = self.notifier.name(),
            "🚀 Reversal bot started"
        );

        loop {
            let started = Instant::now();
            let report = self.run_cycle(Utc::now()).await;
            let elapsed = started.elapsed();

            if report.evaluated > 0 {
                info!(
                    evaluated = report.evaluated,
                    signals = report.signals,
                    notified = report.notified,
                    suppressed = report.suppressed,
                    failures = report.failures,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "✅ Cycle complete"
                );
            }

            let pause = self
                .poll_interval()
                .saturating_sub(elapsed)
                .max(Duration::from_secs(1));

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    info!("🛑 Shutdown requested, stopping");
                    break;
                }
            }
        }

        Ok(())
    }
}
