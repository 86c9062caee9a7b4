//! CSV Persistence Module
//!
//! Append-only audit trail of the alerts that were actually delivered

use anyhow::{Context, Result};
use chrono::Utc;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::debug;

use crate::types::Signal;

const SIGNALS_DIR: &str = "signals";
const HISTORY_FILE: &str = "signals_history.csv";

/// Signal record for CSV storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub recorded_at: String,
    pub signal_id: String,
    pub action: String,
    pub instrument: String,
    pub entry_price: f64,
    pub zone_price: f64,
    pub risk_percent: f64,
    pub volume_strength: f64,
    pub confidence: String,
    pub context_timeframe: String,
    pub entry_timeframe: String,
    pub emitted_at: String,
}

impl From<&Signal> for SignalRecord {
    fn from(signal: &Signal) -> Self {
        Self {
            recorded_at: Utc::now().to_rfc3339(),
            signal_id: signal.id.clone(),
            action: signal.action.to_string(),
            instrument: signal.instrument.clone(),
            entry_price: signal.entry_price,
            zone_price: signal.zone_price,
            risk_percent: signal.risk_percent,
            volume_strength: signal.volume_strength,
            confidence: signal.confidence.to_string(),
            context_timeframe: signal.context_timeframe.to_string(),
            entry_timeframe: signal.entry_timeframe.to_string(),
            emitted_at: signal.emitted_at.to_rfc3339(),
        }
    }
}

/// CSV audit sink for delivered alerts
pub struct AuditLog {
    path: PathBuf,
    writer: Arc<AsyncRwLock<csv::Writer<std::fs::File>>>,
}

impl AuditLog {
    /// Open (or create) `data_dir/signals/signals_history.csv`
    pub fn new(data_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(data_dir).join(SIGNALS_DIR);
        fs::create_dir_all(&dir).context("Failed to create data directory")?;

        let writer = Self::create_writer(&dir, HISTORY_FILE)?;

        Ok(Self {
            path: dir.join(HISTORY_FILE),
            writer: Arc::new(AsyncRwLock::new(writer)),
        })
    }

    fn create_writer(dir: &Path, filename: &str) -> Result<csv::Writer<std::fs::File>> {
        let path = dir.join(filename);
        let file_has_data =
            path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open CSV file")?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one delivered signal
    pub async fn record(&self, signal: &Signal) -> Result<()> {
        let record = SignalRecord::from(signal);
        let mut writer = self.writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write signal record")?;
        writer.flush().context("Failed to flush signal writer")?;

        debug!(signal_id = %record.signal_id, "📝 Signal recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Confidence, Timeframe};
    use chrono::TimeZone;
    use csv::ReaderBuilder;

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "reversal_persistence_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    fn signal(id: &str) -> Signal {
        Signal {
            id: id.to_string(),
            action: Action::Buy,
            instrument: "ETHUSDT".into(),
            entry_price: 2010.0,
            zone_price: 2000.0,
            risk_percent: 0.4975,
            volume_strength: 1.3,
            confidence: Confidence::Medium,
            emitted_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            context_timeframe: Timeframe::Hour1,
            entry_timeframe: Timeframe::Min5,
        }
    }

    #[tokio::test]
    async fn record_writes_header_once_across_reopen() {
        let data_dir = temp_data_dir("reopen");

        let audit = AuditLog::new(data_dir.to_str().unwrap()).unwrap();
        audit.record(&signal("a")).await.unwrap();
        drop(audit);

        let audit = AuditLog::new(data_dir.to_str().unwrap()).unwrap();
        audit.record(&signal("b")).await.unwrap();

        let content = fs::read_to_string(audit.path()).unwrap();
        let headers = content
            .lines()
            .filter(|l| l.starts_with("recorded_at,"))
            .count();
        assert_eq!(headers, 1);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());
        let rows: Vec<SignalRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].signal_id, "a");
        assert_eq!(rows[1].signal_id, "b");
        assert_eq!(rows[0].action, "BUY");
        assert_eq!(rows[0].confidence, "MEDIUM");
        assert_eq!(rows[0].entry_timeframe, "5m");
        assert_eq!(rows[0].emitted_at, "2024-03-10T12:00:00+00:00");

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn create_writer_adds_headers_when_file_exists_but_is_empty() {
        let data_dir = temp_data_dir("headers_on_empty");
        let signals_dir = data_dir.join(SIGNALS_DIR);
        fs::create_dir_all(&signals_dir).unwrap();
        fs::write(signals_dir.join(HISTORY_FILE), "").unwrap();

        let audit = AuditLog::new(data_dir.to_str().unwrap()).unwrap();
        audit.record(&signal("a")).await.unwrap();

        let content = fs::read_to_string(audit.path()).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap_or_default();
        assert!(
            header.starts_with("recorded_at,signal_id,action,instrument,entry_price"),
            "unexpected header line: {}",
            header
        );
        assert!(lines.next().is_some(), "expected one data row after header");

        let _ = fs::remove_dir_all(&data_dir);
    }
}
