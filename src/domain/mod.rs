mod entry;
mod ledger;
mod money;
mod period;

pub use entry::*;
pub use ledger::*;
pub use money::*;
pub use period::*;
