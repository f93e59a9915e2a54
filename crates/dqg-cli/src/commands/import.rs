use std::path::Path;

use dqg_core::transfer::ImportReport;

use crate::commands::common::{open_service, warn_if_unsaved};
use crate::error::CliError;

pub async fn run_import(path: &Path, data_dir: &Path) -> Result<ImportReport, CliError> {
    let raw = tokio::fs::read_to_string(path).await?;

    let service = open_service(data_dir)?;
    let outcome = service.import_text(&raw).await?;
    warn_if_unsaved(outcome.persisted);

    println!("{}", import_summary(&outcome.report));
    Ok(outcome.report)
}

pub fn import_summary(report: &ImportReport) -> String {
    let mut summary = if report.added > 0 {
        format!("Imported {} quote(s).", report.added)
    } else {
        "No new quotes to import.".to_string()
    };

    let skipped = report.skipped_duplicate + report.skipped_invalid;
    if skipped > 0 {
        summary.push_str(&format!(
            " Skipped {} duplicate and {} invalid entr{}.",
            report.skipped_duplicate,
            report.skipped_invalid,
            if report.skipped_invalid == 1 { "y" } else { "ies" }
        ));
    }
    summary
}
