//! dqg-core - Core library for the Dynamic Quote Generator
//!
//! This crate contains the quote model, the in-memory quote store, the
//! reconciliation engine used to merge remote quotes, and the JSON
//! import/export adapter shared by all dqg front-ends.

pub mod categories;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod transfer;
pub mod util;

pub use error::{Error, Result};
pub use models::{ConflictBackup, Quote, QuoteId, QuoteSource};
pub use store::QuoteStore;
