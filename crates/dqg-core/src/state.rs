//! Shared sync state types.

use serde::{Deserialize, Serialize};

/// Sync state of a quote service, as shown by front-ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No sync attempted yet
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

