//! Conflict backup model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

use super::quote::Quote;

/// Snapshot pair captured when the server copy overwrote a local quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictBackup {
    /// Local quote as it was before the overwrite
    pub local: Quote,
    /// Server quote that replaced it
    pub server: Quote,
}

/// How the user settles a pending conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Restore the local snapshot
    KeepLocal,
    /// Accept the server copy already in the store
    KeepServer,
}

impl FromStr for ConflictResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "keep-local" => Ok(Self::KeepLocal),
            "server" | "keep-server" => Ok(Self::KeepServer),
            other => Err(Error::InvalidInput(format!(
                "Unknown conflict resolution: {other}"
            ))),
        }
    }
}
