// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use fingo::application::LedgerService;
use fingo::storage::LedgerStore;
use tempfile::TempDir;

/// Helper to create a store backed by a file in a temporary directory.
/// The file itself does not exist yet.
pub fn test_store() -> (LedgerStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path().join("db.json"));
    (store, temp_dir)
}

/// Helper to create a service over a fresh temporary ledger file
pub fn test_service() -> (LedgerService, TempDir) {
    let (store, temp_dir) = test_store();
    (LedgerService::new(store), temp_dir)
}

/// Helper to parse a date string into DateTime<Utc> at noon
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
}

/// Every `db.json.broken-*` file next to the ledger
pub fn backups(dir: &TempDir) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("db.json.broken-"))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}
