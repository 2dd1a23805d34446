// Application layer: one load -> mutate -> save cycle per call.
// The chat dispatcher and the CLI both go through LedgerService.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
