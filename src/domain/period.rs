use chrono::{
    DateTime, Datelike, LocalResult, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone,
};
use serde::{Deserialize, Serialize};

use super::{Rupiah, TimestampMillis};

/// One calendar month, as named by a `YYYY-MM` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthPeriod {
    /// Build a period for a 1-based month. Returns None for month 0 or 13+.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self { start, end })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Parse a strict `YYYY-MM` argument.
    pub fn parse(arg: &str) -> Option<Self> {
        let bytes = arg.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return None;
        }

        let year: i32 = arg[..4].parse().ok()?;
        let month: u32 = arg[5..].parse().ok()?;
        Self::new(year, month)
    }

    /// Parse the argument if present and valid, otherwise fall back to the
    /// month containing `today`.
    pub fn parse_or_current(arg: Option<&str>, today: NaiveDate) -> Self {
        arg.and_then(Self::parse)
            .unwrap_or_else(|| Self::containing(today))
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// `YYYY-MM`, zero padded.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }

    /// Half-open `[start, end)` bounds in epoch milliseconds, with both
    /// boundaries taken at local midnight in `tz`.
    pub fn bounds_millis<Tz: TimeZone>(&self, tz: &Tz) -> (TimestampMillis, TimestampMillis) {
        (
            local_midnight(tz, self.start).timestamp_millis(),
            local_midnight(tz, self.end).timestamp_millis(),
        )
    }
}

/// Midnight at the start of `date` in `tz`. When a DST jump skips midnight
/// the first hour after the gap is used instead.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(midnight + TimeDelta::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

/// Totals for one calendar month of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub period: String,
    pub total_credit: Rupiah,
    pub total_debit: Rupiah,
    pub credit_count: usize,
    pub debit_count: usize,
    /// total_credit - total_debit
    pub net: Rupiah,
    /// Balance of the whole ledger, not just this month
    pub current_balance: Rupiah,
}
