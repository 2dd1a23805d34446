// Chat command layer: parses `/command args` messages and renders the
// replies. The transport that delivers the messages lives outside this crate.

mod command;
mod dispatcher;

pub use command::*;
pub use dispatcher::*;
