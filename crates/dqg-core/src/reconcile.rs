//! Reconciliation of remote quotes into the local store.
//!
//! Policy is server-wins with undo: when a remote record shares an id with a
//! local quote but differs in text or category, the server copy is applied
//! and the local copy is kept in a [`ConflictBackups`] entry until the user
//! resolves it. A later conflict on the same id replaces the earlier backup.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ids::Clock;
use crate::models::{ConflictBackup, ConflictResolution, Quote, QuoteId, QuoteSource};
use crate::store::QuoteStore;

/// Pending conflicts keyed by quote id.
pub type ConflictBackups = BTreeMap<QuoteId, ConflictBackup>;

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Remote quotes appended because their id was new
    pub merged: usize,
    /// Remote quotes that overwrote a differing local copy
    pub conflicts: usize,
    /// Remote quotes whose content already matched
    pub unchanged: usize,
    /// Ids overwritten in this pass, in batch order
    pub conflict_ids: Vec<QuoteId>,
}

impl ReconcileReport {
    pub const fn has_changes(&self) -> bool {
        self.merged > 0 || self.conflicts > 0
    }
}

/// Merge `remote` into `store`, recording overwritten local quotes in `backups`.
///
/// Never removes a quote from the store.
pub fn reconcile(
    store: &mut QuoteStore,
    remote: impl IntoIterator<Item = Quote>,
    backups: &mut ConflictBackups,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for incoming in remote {
        let Some(local) = store.get_mut(&incoming.id) else {
            report.merged += 1;
            store.insert_unchecked(incoming);
            continue;
        };

        if local.same_content(&incoming) {
            local.updated_at = local.updated_at.max(incoming.updated_at);
            local.source = QuoteSource::Server;
            report.unchanged += 1;
            continue;
        }

        tracing::warn!("Conflict on {}: server version applied", incoming.id);
        let previous = std::mem::replace(local, incoming.clone());
        backups.insert(
            incoming.id.clone(),
            ConflictBackup {
                local: previous,
                server: incoming.clone(),
            },
        );
        report.conflicts += 1;
        report.conflict_ids.push(incoming.id);
    }

    report
}

/// Settle a pending conflict.
///
/// `KeepLocal` restores the local snapshot with a fresh timestamp and returns
/// it; `KeepServer` only discards the backup.
pub fn resolve_conflict(
    store: &mut QuoteStore,
    backups: &mut ConflictBackups,
    id: &QuoteId,
    resolution: ConflictResolution,
    clock: &dyn Clock,
) -> Result<Option<Quote>> {
    if !backups.contains_key(id) {
        return Err(Error::NotFound(format!("No pending conflict for {id}")));
    }

    match resolution {
        ConflictResolution::KeepServer => {
            backups.remove(id);
            Ok(None)
        }
        ConflictResolution::KeepLocal => {
            if !store.contains_id(id) {
                return Err(Error::NotFound(id.to_string()));
            }
            let Some(backup) = backups.remove(id) else {
                return Err(Error::NotFound(format!("No pending conflict for {id}")));
            };
            let restored = Quote {
                updated_at: clock.now_ms(),
                source: QuoteSource::Local,
                ..backup.local
            };
            store.replace(restored.clone())?;
            Ok(Some(restored))
        }
    }
}
