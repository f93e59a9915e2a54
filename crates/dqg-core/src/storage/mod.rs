//! Key-value persistence gateway.
//!
//! Values are serialized JSON blobs. A failed `set` is reported as
//! [`Error::Storage`](crate::Error::Storage); callers decide whether to degrade.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key holding the serialized quote array.
pub const KEY_QUOTES: &str = "dqg_quotes_v2";
/// Key holding the selected category filter.
pub const KEY_SELECTED_CATEGORY: &str = "dqg_selectedCategory_v2";
/// Key holding the last successful sync timestamp (Unix ms).
pub const KEY_LAST_SYNC: &str = "dqg_lastSync_v2";
/// Key holding pending conflict backups.
pub const KEY_CONFLICTS: &str = "dqg_conflicts_v2";

/// Trait for key-value storage operations
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
