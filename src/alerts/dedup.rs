//! Deduplication gate - one alert per instrument, action and calendar day
//!
//! Calendar days are taken in the operator's UTC offset. Keys older than
//! `retention_days` are purged whenever a new signal is checked.

use chrono::{Duration, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::config::DedupConfig;
use crate::types::{Action, Signal};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub instrument: String,
    pub action: Action,
    pub date: NaiveDate,
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.instrument,
            self.action,
            self.date.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone)]
pub struct DeduplicationGate {
    seen: HashSet<DedupKey>,
    retention_days: i64,
    offset: FixedOffset,
}

impl DeduplicationGate {
    pub fn new(retention_days: i64, offset: FixedOffset) -> Self {
        Self {
            seen: HashSet::new(),
            retention_days: retention_days.max(1),
            offset,
        }
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).unwrap_or(Utc.fix());
        Self::new(config.retention_days, offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn key_for(&self, signal: &Signal) -> DedupKey {
        DedupKey {
            instrument: signal.instrument.clone(),
            action: signal.action,
            date: signal.emitted_at.with_timezone(&self.offset).date_naive(),
        }
    }

    /// `true` (and remember the key) when no equivalent signal was emitted
    /// on the same calendar day, `false` otherwise.
    pub fn should_emit(&mut self, signal: &Signal) -> bool {
        let key = self.key_for(signal);
        self.purge_before(key.date - Duration::days(self.retention_days));

        if self.seen.contains(&key) {
            debug!(key = %key, "ℹ️ Duplicate alert suppressed");
            return false;
        }
        self.seen.insert(key);
        true
    }

    /// Forget the key of a signal whose delivery failed so it can be retried
    pub fn release(&mut self, signal: &Signal) -> bool {
        let key = self.key_for(signal);
        self.seen.remove(&key)
    }

    /// Drop keys dated before `cutoff`, returns how many were removed
    pub fn purge_before(&mut self, cutoff: NaiveDate) -> usize {
        let before = self.seen.len();
        self.seen.retain(|k| k.date >= cutoff);
        before - self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for DeduplicationGate {
    fn default() -> Self {
        Self::from_config(&DedupConfig::default())
    }
}
