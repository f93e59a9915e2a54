//! Shared services used across front-ends.

mod auto_sync;
mod quotes;

pub use auto_sync::AutoSync;
pub use quotes::{ImportOutcome, QuoteService, ResolveOutcome, SyncOutcome};
