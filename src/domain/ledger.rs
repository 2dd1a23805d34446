use std::collections::BTreeMap;
use std::fmt;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    parse_amount, Entry, EntryKind, MonthPeriod, MonthlySummary, ParseAmountError, Rupiah,
    TimestampMillis,
};

pub type UserId = String;

/// Every user's ledger, persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub users: BTreeMap<UserId, Ledger>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ledger for `user_id`, creating an empty one on first access.
    pub fn get_or_create(&mut self, user_id: &str) -> &mut Ledger {
        self.users.entry(user_id.to_string()).or_default()
    }

    pub fn get(&self, user_id: &str) -> Option<&Ledger> {
        self.users.get(user_id)
    }
}

/// One user's running balance and append-only log of entries.
///
/// The balance is a cached running total: every operation that touches the
/// log updates it in the same step, so reads never recompute it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Reserved, never enforced
    #[serde(default)]
    pub authorized: bool,
    #[serde(rename = "saldo", default)]
    balance: Rupiah,
    #[serde(rename = "tx", default)]
    entries: Vec<Entry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Number of entries to show in a history listing, always within 1..=50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCount(usize);

impl HistoryCount {
    pub const MIN: usize = 1;
    pub const MAX: usize = 50;
    pub const DEFAULT: usize = 10;

    pub fn new(count: i64) -> Self {
        Self(count.clamp(Self::MIN as i64, Self::MAX as i64) as usize)
    }

    /// Read a count from the leading integer of `arg` ("7", "-3", "12x").
    /// Missing or non-numeric text gives the default.
    pub fn parse(arg: Option<&str>) -> Self {
        let Some(arg) = arg.map(str::trim) else {
            return Self::default();
        };

        let (negative, rest) = match arg.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, arg.strip_prefix('+').unwrap_or(arg)),
        };
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Self::default();
        }

        // Anything too long for i64 is clamped to the maximum anyway
        let value = digits.parse::<i64>().unwrap_or(i64::MAX);
        Self::new(if negative { -value } else { value })
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for HistoryCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassemble a ledger read back from storage. The balance is taken as
    /// stored; `verify_balance` reports whether it still matches `entries`.
    pub(crate) fn from_parts(
        authorized: bool,
        balance: Rupiah,
        entries: Vec<Entry>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            authorized,
            balance,
            entries,
            extra,
        }
    }

    /// Current balance. O(1), trusts the running total.
    pub fn balance(&self) -> Rupiah {
        self.balance
    }

    /// All entries in append (chronological) order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and record an entry, returning the new balance and the entry
    /// as appended.
    ///
    /// `amount_text` is free-form ("50.000", "Rp 50,000"); `note` is trimmed
    /// and must not be blank. Nothing is mutated when validation fails.
    pub fn apply_entry(
        &mut self,
        kind: EntryKind,
        amount_text: &str,
        note: &str,
        timestamp: TimestampMillis,
    ) -> Result<(Rupiah, &Entry), EntryError> {
        let amount = parse_amount(amount_text).map_err(EntryError::InvalidAmount)?;
        let note = note.trim();
        if note.is_empty() {
            return Err(EntryError::MissingNote);
        }

        let balance = self
            .balance
            .checked_add(kind.signed(amount))
            .ok_or(EntryError::BalanceOverflow)?;

        let index = self.entries.len();
        self.entries.push(Entry::new(kind, amount, note, timestamp));
        self.balance = balance;
        Ok((balance, &self.entries[index]))
    }

    /// The last `count` entries, newest first. Empty when there are none.
    pub fn recent_history(&self, count: HistoryCount) -> Vec<&Entry> {
        self.entries.iter().rev().take(count.get()).collect()
    }

    /// Totals for entries whose timestamp falls within `period`, with month
    /// boundaries taken at local midnight in `tz`.
    pub fn monthly_summary<Tz: TimeZone>(&self, period: MonthPeriod, tz: &Tz) -> MonthlySummary {
        let (start, end) = period.bounds_millis(tz);

        let mut summary = MonthlySummary {
            period: period.label(),
            total_credit: 0,
            total_debit: 0,
            credit_count: 0,
            debit_count: 0,
            net: 0,
            current_balance: self.balance,
        };

        for entry in self
            .entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
        {
            match entry.kind {
                EntryKind::Credit => {
                    summary.total_credit = summary.total_credit.saturating_add(entry.amount);
                    summary.credit_count += 1;
                }
                EntryKind::Debit => {
                    summary.total_debit = summary.total_debit.saturating_add(entry.amount);
                    summary.debit_count += 1;
                }
            }
        }

        summary.net = summary.total_credit.saturating_sub(summary.total_debit);
        summary
    }

    /// Remove the most recent entry and reverse its effect on the balance.
    /// Returns None, without touching anything, when the log is empty.
    pub fn undo_last(&mut self) -> Option<Entry> {
        let last = self.entries.pop()?;
        self.balance = self.balance.saturating_sub(last.signed_amount());
        Some(last)
    }

    /// Zero the balance and drop every entry.
    pub fn reset(&mut self) {
        self.balance = 0;
        self.entries.clear();
    }

    /// Recompute the balance from the log and compare it to the running total.
    pub fn verify_balance(&self) -> bool {
        compute_balance(&self.entries) == Some(self.balance)
    }
}

/// Signed sum of all entries. None if the sum does not fit in an i64.
pub fn compute_balance(entries: &[Entry]) -> Option<Rupiah> {
    entries
        .iter()
        .try_fold(0 as Rupiah, |balance, entry| {
            balance.checked_add(entry.signed_amount())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryError {
    InvalidAmount(ParseAmountError),
    MissingNote,
    BalanceOverflow,
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::InvalidAmount(e) => write!(f, "Invalid amount: {}", e),
            EntryError::MissingNote => write!(f, "A note is required"),
            EntryError::BalanceOverflow => write!(f, "Balance would overflow"),
        }
    }
}

impl std::error::Error for EntryError {}
