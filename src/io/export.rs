use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Entry, Rupiah};

/// One user's ledger as written by a JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user: String,
    pub balance: Rupiah,
    pub entries: Vec<Entry>,
}

/// Exporter for writing a user's ledger to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export a user's entries to CSV, oldest first. Returns the row count.
    pub fn export_entries_csv<W: Write>(&self, user_id: &str, writer: W) -> Result<usize> {
        let ledger = self.service.ledger(user_id)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["timestamp", "type", "amount", "note"])?;

        let mut count = 0;
        for entry in ledger.entries() {
            let timestamp = entry
                .recorded_at()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| entry.timestamp.to_string());

            csv_writer.write_record([
                timestamp.as_str(),
                entry.kind.as_str(),
                entry.amount.to_string().as_str(),
                entry.note.as_str(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a user's whole ledger as a pretty-printed JSON snapshot
    pub fn export_ledger_json<W: Write>(
        &self,
        user_id: &str,
        mut writer: W,
    ) -> Result<LedgerSnapshot> {
        let ledger = self.service.ledger(user_id)?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            user: user_id.to_string(),
            balance: ledger.balance(),
            entries: ledger.entries().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
