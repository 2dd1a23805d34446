mod document;
mod file_store;

pub use document::*;
pub use file_store::*;

/// Default ledger file, relative to the working directory
pub const DEFAULT_DB_FILE: &str = "./db.json";
