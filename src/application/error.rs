use thiserror::Error;

use crate::domain::{EntryError, ParseAmountError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(ParseAmountError),

    #[error("A note is required")]
    MissingNote,

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by what the user typed, as opposed to the
    /// system failing. These are answered with a usage message.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, AppError::InvalidAmount(_) | AppError::MissingNote)
    }
}

impl From<EntryError> for AppError {
    fn from(e: EntryError) -> Self {
        match e {
            EntryError::InvalidAmount(reason) => AppError::InvalidAmount(reason),
            EntryError::MissingNote => AppError::MissingNote,
            EntryError::BalanceOverflow => AppError::BalanceOverflow,
        }
    }
}
