use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    compute_balance, Entry, EntryKind, HistoryCount, Ledger, MonthPeriod, MonthlySummary,
    Rupiah,
};
use crate::storage::{LedgerStore, LoadOutcome};

use super::AppError;

/// Application service providing the ledger operations for one user at a time.
/// This is the primary interface for any client (chat dispatcher, CLI).
///
/// Every call loads the whole store, works on one user's ledger and saves the
/// store again if it changed. Mutating calls take `&mut self`, so a process
/// that owns a single service can never interleave two writes.
pub struct LedgerService {
    store: LedgerStore,
}

/// Result of recording an entry
#[derive(Debug, Clone)]
pub struct EntryRecorded {
    pub entry: Entry,
    pub balance: Rupiah,
}

/// Result of undoing the last entry
#[derive(Debug, Clone)]
pub struct UndoResult {
    pub removed: Entry,
    pub balance: Rupiah,
}

/// Outcome of comparing a ledger's running balance to its log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub entry_count: usize,
    pub balance: Rupiah,
    /// Signed sum of the log, None if it overflows
    pub computed_balance: Option<Rupiah>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.computed_balance == Some(self.balance)
    }
}

impl LedgerService {
    /// Create a new ledger service over the given store.
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Create a service for the JSON file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(LedgerStore::open(path))
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Load the store once so a missing file is created and a corrupt one
    /// is recovered before the first command arrives. Data set aside while
    /// reading is written back right away, so the file shows where it went.
    pub fn init(&self) -> Result<LoadOutcome, AppError> {
        let (store, outcome) = self.store.load_report()?;
        if let LoadOutcome::Repaired(_) = outcome {
            self.store.save(&store)?;
        }
        Ok(outcome)
    }

    /// The user's ledger as currently stored (empty if the user is new).
    pub fn ledger(&self, user_id: &str) -> Result<Ledger, AppError> {
        let store = self.store.load()?;
        Ok(store.get(user_id).cloned().unwrap_or_default())
    }

    // ========================
    // Mutations
    // ========================

    /// Record a credit or debit for `user_id`.
    /// Invalid input is rejected before anything is written.
    pub fn record(
        &mut self,
        user_id: &str,
        kind: EntryKind,
        amount_text: &str,
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<EntryRecorded, AppError> {
        let mut store = self.store.load()?;
        let ledger = store.get_or_create(user_id);

        let (balance, entry) = ledger.apply_entry(kind, amount_text, note, at.timestamp_millis())?;
        let entry = entry.clone();

        self.store.save(&store)?;

        tracing::info!(
            user = user_id,
            kind = kind.as_str(),
            amount = entry.amount,
            balance,
            "Recorded entry"
        );
        Ok(EntryRecorded { entry, balance })
    }

    /// Remove the user's most recent entry. Ok(None) when there is nothing
    /// to undo; the store is only written when something was removed.
    pub fn undo_last(&mut self, user_id: &str) -> Result<Option<UndoResult>, AppError> {
        let mut store = self.store.load()?;
        let ledger = store.get_or_create(user_id);

        let Some(removed) = ledger.undo_last() else {
            return Ok(None);
        };
        let balance = ledger.balance();

        self.store.save(&store)?;

        tracing::info!(
            user = user_id,
            kind = removed.kind.as_str(),
            amount = removed.amount,
            balance,
            "Undid last entry"
        );
        Ok(Some(UndoResult { removed, balance }))
    }

    /// Clear the user's ledger. Irreversible.
    pub fn reset(&mut self, user_id: &str) -> Result<(), AppError> {
        let mut store = self.store.load()?;
        let ledger = store.get_or_create(user_id);
        let dropped = ledger.entries().len();
        ledger.reset();

        self.store.save(&store)?;

        tracing::info!(user = user_id, dropped, "Reset ledger");
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Current balance for the user.
    pub fn balance(&self, user_id: &str) -> Result<Rupiah, AppError> {
        Ok(self.ledger(user_id)?.balance())
    }

    /// The user's latest entries, newest first.
    pub fn history(&self, user_id: &str, count: HistoryCount) -> Result<Vec<Entry>, AppError> {
        let ledger = self.ledger(user_id)?;
        Ok(ledger.recent_history(count).into_iter().cloned().collect())
    }

    /// Totals for one calendar month, with month boundaries in `tz`.
    pub fn monthly_summary<Tz: TimeZone>(
        &self,
        user_id: &str,
        period: MonthPeriod,
        tz: &Tz,
    ) -> Result<MonthlySummary, AppError> {
        Ok(self.ledger(user_id)?.monthly_summary(period, tz))
    }

    /// Compare the user's running balance with the signed sum of the log.
    pub fn check(&self, user_id: &str) -> Result<IntegrityReport, AppError> {
        let ledger = self.ledger(user_id)?;
        let report = IntegrityReport {
            entry_count: ledger.entries().len(),
            balance: ledger.balance(),
            computed_balance: compute_balance(ledger.entries()),
        };

        if !report.is_consistent() {
            tracing::warn!(
                user = user_id,
                balance = report.balance,
                computed = ?report.computed_balance,
                "Ledger balance does not match its entries"
            );
        }
        Ok(report)
    }
}
