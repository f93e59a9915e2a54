use std::path::Path;

use dqg_core::config::AppConfig;
use dqg_core::models::ConflictResolution;
use dqg_core::reconcile::ConflictBackups;
use dqg_core::remote::{HttpRemoteSource, RemoteSource};
use dqg_core::services::SyncOutcome;

use crate::cli::KeepVersion;
use crate::commands::common::{
    conflict_to_item, format_conflict_lines, format_sync_timestamp, open_service,
    resolve_conflict_id, warn_if_unsaved, ConflictItem,
};
use crate::error::CliError;

pub async fn run_sync(config: &AppConfig, data_dir: &Path) -> Result<SyncOutcome, CliError> {
    let remote = HttpRemoteSource::from_config(config)?;
    run_sync_with(&remote, data_dir).await
}

pub async fn run_sync_with<R: RemoteSource>(
    remote: &R,
    data_dir: &Path,
) -> Result<SyncOutcome, CliError> {
    let service = open_service(data_dir)?;
    let outcome = service.sync(remote).await?;
    warn_if_unsaved(outcome.persisted);

    let pending = service.pending_conflicts().await;
    for line in sync_summary_lines(&outcome, &pending) {
        println!("{line}");
    }
    Ok(outcome)
}

/// Lines printed after a sync pass. Conflicts come first, each with the
/// command that undoes the server overwrite.
pub fn sync_summary_lines(outcome: &SyncOutcome, pending: &ConflictBackups) -> Vec<String> {
    let report = &outcome.report;
    let mut lines = Vec::new();

    if report.conflicts > 0 {
        lines.push(format!(
            "{} conflict(s) resolved with the server version:",
            report.conflicts
        ));
        let current = report
            .conflict_ids
            .iter()
            .filter_map(|id| pending.get_key_value(id))
            .map(|(id, backup)| (id.clone(), backup.clone()))
            .collect::<ConflictBackups>();
        for line in format_conflict_lines(&current) {
            lines.push(format!("  {line}"));
        }
        for id in &report.conflict_ids {
            lines.push(format!("  undo: dqg sync resolve {id} --keep local"));
        }
    }

    if report.merged > 0 {
        lines.push(format!("Synced {} new server quote(s).", report.merged));
    } else if report.conflicts == 0 {
        lines.push("Sync complete. No changes.".to_string());
    }

    lines.push(format!(
        "Last sync: {}",
        format_sync_timestamp(outcome.synced_at)
    ));
    lines
}

pub async fn run_sync_conflicts(as_json: bool, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let conflicts = service.pending_conflicts().await;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(|(id, backup)| conflict_to_item(id, backup))
            .collect::<Vec<ConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No pending conflicts.");
        return Ok(());
    }

    for line in format_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_sync_resolve(id: &str, keep: KeepVersion, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let conflicts = service.pending_conflicts().await;
    let conflict_id = resolve_conflict_id(id.trim(), &conflicts)?;

    let outcome = service
        .resolve_conflict(&conflict_id, resolution_for(keep))
        .await?;
    warn_if_unsaved(outcome.persisted);

    match outcome.restored {
        Some(quote) => println!("Reverted {} to the local version.", quote.id),
        None => println!("Kept the server version of {conflict_id}."),
    }
    Ok(())
}

pub const fn resolution_for(keep: KeepVersion) -> ConflictResolution {
    match keep {
        KeepVersion::Local => ConflictResolution::KeepLocal,
        KeepVersion::Server => ConflictResolution::KeepServer,
    }
}
