use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dqg_core::config::AppConfig;
use dqg_core::remote::HttpRemoteSource;
use dqg_core::services::AutoSync;

use crate::commands::common::{format_sync_timestamp, open_service};
use crate::error::CliError;

/// Run auto-sync in the foreground until Ctrl-C.
pub async fn run_watch(
    config: &AppConfig,
    interval_secs: Option<u64>,
    data_dir: &Path,
) -> Result<(), CliError> {
    let interval = interval_secs
        .filter(|secs| *secs > 0)
        .map_or_else(|| config.auto_sync_interval(), Duration::from_secs);

    let remote = Arc::new(HttpRemoteSource::from_config(config)?);
    let service = open_service(data_dir)?;

    println!(
        "Syncing with {} every {}s. Press Ctrl-C to stop.",
        remote.url(),
        interval.as_secs()
    );

    let auto_sync = AutoSync::start_with(service, remote, interval, |result| match result {
        Ok(outcome) => {
            let report = &outcome.report;
            if report.has_changes() {
                println!(
                    "[{}] {} new, {} conflict(s)",
                    format_sync_timestamp(outcome.synced_at),
                    report.merged,
                    report.conflicts
                );
                for id in &report.conflict_ids {
                    println!("  undo: dqg sync resolve {id} --keep local");
                }
            }
        }
        Err(error) => eprintln!("Sync failed: {error}"),
    });

    tokio::signal::ctrl_c().await?;
    auto_sync.stop().await;
    println!("Stopped.");
    Ok(())
}
