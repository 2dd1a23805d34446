use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntryError, ParseAmountError, Rupiah};

/// Milliseconds since the Unix epoch, as stored in the `ts` field.
pub type TimestampMillis = i64;

/// Direction of an entry. Stored with the Indonesian names the bot speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Money coming in ("masuk"), increases the balance
    #[serde(rename = "masuk")]
    Credit,
    /// Money going out ("keluar"), decreases the balance
    #[serde(rename = "keluar")]
    Debit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Credit => "masuk",
            EntryKind::Debit => "keluar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "masuk" => Some(EntryKind::Credit),
            "keluar" => Some(EntryKind::Debit),
            _ => None,
        }
    }

    /// The effect of `amount` on the balance for this kind of entry.
    pub fn signed(&self, amount: Rupiah) -> Rupiah {
        match self {
            EntryKind::Credit => amount,
            EntryKind::Debit => -amount,
        }
    }

    /// "+" for credits, "-" for debits.
    pub fn sign(&self) -> &'static str {
        match self {
            EntryKind::Credit => "+",
            EntryKind::Debit => "-",
        }
    }
}

/// A single line in a user's ledger. Entries are never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Amount in Rupiah (always positive)
    #[serde(rename = "nominal")]
    pub amount: Rupiah,
    /// Free-text description, never blank
    #[serde(rename = "ket")]
    pub note: String,
    #[serde(rename = "ts")]
    pub timestamp: TimestampMillis,
    /// Fields written by other tools, kept so a save does not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    pub fn new(
        kind: EntryKind,
        amount: Rupiah,
        note: impl Into<String>,
        timestamp: TimestampMillis,
    ) -> Self {
        assert!(amount > 0, "Entry amount must be positive");
        Self {
            kind,
            amount,
            note: note.into(),
            timestamp,
            extra: Map::new(),
        }
    }

    /// Check the rules `new` and `apply_entry` guarantee for entries they
    /// create, for entries that come from elsewhere (a file on disk).
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.amount <= 0 {
            return Err(EntryError::InvalidAmount(ParseAmountError::NotPositive));
        }
        if self.note.trim().is_empty() {
            return Err(EntryError::MissingNote);
        }
        Ok(())
    }

    /// Balance effect of this entry.
    pub fn signed_amount(&self) -> Rupiah {
        self.kind.signed(self.amount)
    }

    /// The entry timestamp as a UTC datetime, if it is within chrono's range.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
