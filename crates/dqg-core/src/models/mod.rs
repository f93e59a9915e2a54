//! Data models for dqg

mod conflict;
mod quote;

pub use conflict::{ConflictBackup, ConflictResolution};
pub use quote::{Quote, QuoteId, QuoteSource, LOCAL_ID_PREFIX, REMOTE_ID_PREFIX};
